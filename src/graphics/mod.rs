//! Graphics: the drawing context, finished draw lists, the frame pipeline
//! and the terminal rasterizer.

pub mod drawlist;
pub mod pipeline;
pub mod terminal;

pub use drawlist::{Color, DrawCommand, DrawList, DrawState, Graphics, Transform};
pub use pipeline::{
    frame_pipeline, run_display, Display, Frame, FrameReceiver, FrameSender, NullDisplay,
    PipelineError,
};
pub use terminal::{CharGrid, TerminalDisplay};
