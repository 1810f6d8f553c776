//! vecstage
//!
//! Timeline-driven vector animation player: shapes are tessellated once at load time,
//! sprites replay per-frame display-list directives, and a `Player` drives the root clip
//! against a `RenderDevice`.
//!
//! Design rule: keep this file thin.

pub mod character;
pub mod display;
pub mod engine;
pub mod render;
pub mod shape;
pub mod util;

pub use character::{Character, CharacterId, Dictionary, Directive, PlaceObject, Sprite};
pub use display::{Depth, MovieClip, Node, Primitive};
pub use engine::{Movie, Player};
pub use render::device::{RecordingDevice, RenderDevice, SoftwareDevice};
pub use render::{Color, ColorTransform, Matrix2D, Point2f, Rect, RenderContext};
pub use shape::{Shape, ShapeBuilder, ShapeError, ShapeFill, TessError};
pub use util::config::{ConfigError, PlayerConfig};
