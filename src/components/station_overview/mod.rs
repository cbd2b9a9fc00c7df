//! Station overview: every space orbiting the ArcheCore on one map.
//!
//! The overview is split into pure engines and one browser component:
//! - [`metrics`]: per-space node/edge/cluster counts and station maxima
//! - [`layout`]: deterministic orbital placement and projection of each space
//! - [`offsets`]: user drag offsets layered over the computed layout
//! - [`interpolate`]: easing of rendered clusters toward their targets
//! - [`camera`] and [`gesture`]: zoom, pan and input disambiguation
//! - [`drag`]: hit-testing and dragging spaces around the core
//! - [`render`]: the drawable [`Scene`]
//!
//! [`OverviewState`] ties the engines together and [`StationOverview`] draws
//! its scene as SVG.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use symbolfield_station::components::station_overview::StationOverview;
//! use symbolfield_station::store::{BrowserStorage, LocalSpaceStore};
//!
//! let store = Rc::new(LocalSpaceStore::new(Rc::new(BrowserStorage), Default::default()));
//! view! { <StationOverview store=store /> }
//! ```

pub mod camera;
mod component;
pub mod drag;
pub mod gesture;
pub mod hotkeys;
pub mod interpolate;
pub mod layout;
pub mod metrics;
pub mod offsets;
pub mod render;
pub mod scale;
mod state;
pub mod theme;
mod types;

pub use camera::{Camera, Focus, ViewBox, Viewport};
pub use component::StationOverview;
pub use drag::{DragController, DragRelease};
pub use gesture::{DeltaMode, GestureAction, GestureInterpreter, InputEvent, PointerKind, PointerTarget};
pub use hotkeys::{ZOOM_HOTKEY_EVENT, ZoomCommand, ZoomHotkeyDetail};
pub use interpolate::{FrameScheduler, Interpolator, ManualScheduler};
pub use layout::{SpaceSnapshot, StationSnapshot, build_clusters};
pub use metrics::{MaxMetrics, SpaceMetrics, compute_max_metrics, compute_metrics};
pub use offsets::{LayoutOffsetMap, LayoutOffsetStore};
pub use render::{ClusterScene, Scene, SceneChrome, StationSummary};
pub use scale::DetailLevel;
pub use state::{OverviewEvent, OverviewState, SceneChange};
pub use theme::StationTheme;
pub use types::{
	AreaAnchor, AreaShape, Bounds, EdgeBase, NodeBase, NodeData, NodeKind, NodeMeta, Point,
	ProjectedArea, ProjectedLink, ProjectedPoint, RawArea, SpaceCluster, SpaceGraphData,
	SpaceSummary,
};
