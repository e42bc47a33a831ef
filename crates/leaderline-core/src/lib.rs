//! LeaderLine Core Library
//!
//! Platform-agnostic engine for drawing connector lines between two elements:
//! rectangle math, layout-free bounds sampling, socket resolution, the
//! positioning state machine and the SVG path builder. The platform is reached
//! through the traits in [`bounds`], [`frame`], [`surface`] and [`element`].

pub mod attributes;
pub mod bounds;
pub mod callbacks;
pub mod connector;
pub mod element;
pub mod error;
pub mod events;
pub mod frame;
pub mod geometry;
pub mod path;
pub mod render;
pub mod services;
pub mod socket;
pub mod style;
pub mod surface;
pub mod transform;

pub use attributes::{AttributeChange, AttributeObserver};
pub use bounds::{BoundsFuture, BoundsObserver, BoundsSampler};
pub use callbacks::{CallbackId, CallbackStore};
pub use connector::{LeaderLine, Reference, SOURCE_SELECTOR_ATTRIBUTE, TARGET_SELECTOR_ATTRIBUTE};
pub use element::{ChildLookup, ChildRef, ElementId, ElementStyle, Features, OwnerRegistry, SelectorResolver};
pub use error::{LeaderLineError, LeaderLineResult};
pub use events::{
    DrawEvent, LeaderLineObserver, ObserverId, PositionEvent, ReferenceChangeEvent, ReferenceKind,
    ValidateEvent,
};
pub use frame::{FrameDriver, FrameScheduler, FrameTask};
pub use geometry::{RectExt, rect_from_xywh};
pub use path::{DrawCommand, adjust_start, build_draw, path_command, viewport};
pub use render::LineRenderer;
pub use services::Services;
pub use socket::{CornerAngles, Socket, SocketResolution, angle_between, resolve_sockets};
pub use style::{
    Curve, DashAnimationConfig, DashAnimationUpdate, DashConfig, DashUpdate, Repeat, StyleConfiguration,
    Seconds, StyleUpdate, Timing, Toggle,
};
pub use surface::{ConnectorSurface, MemorySurface, SvgNode};
pub use transform::Transform;
