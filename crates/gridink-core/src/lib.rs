//! GridInk Core Library
//!
//! Lattice geometry, input classification and undoable object storage for
//! the GridInk puzzle editor. Rendering is left to the caller.

pub mod camera;
pub mod editor;
pub mod error;
pub mod gesture;
pub mod history;
pub mod input;
pub mod lattice;
pub mod layers;
pub mod outline;
pub mod path;
pub mod selector;
pub mod settings;
pub mod timer;

pub use camera::Camera;
pub use editor::{DEFAULT_GRID_ID, Editor, LayerDisplay};
pub use error::{CoreError, CoreResult};
pub use gesture::{GestureAction, GestureClassifier, GestureMode, PointerTrack};
pub use history::{BatchId, HistoryAction, HistoryStore, LayerStorage, ObjectChange};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent, PointerPhase};
pub use lattice::{GridBounds, LatticePoint, PointKind, Query, QueryLeaf, QueryOptions, SquareGrid};
pub use layers::{Layer, LayerBehavior, Primitive, PuzzleObject};
pub use outline::shrinkwrap;
pub use path::HopStraight;
pub use selector::select_points;
pub use settings::Settings;
pub use timer::ReleaseTimer;
