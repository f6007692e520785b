// Hardware parameter-stream interface shared by the translucency sort core
// and the ISP/TSP packing layers.

pub mod buffer;
pub mod words;

pub use buffer::ParamBuffer;
pub use words::{ObjectWord, PASS_MARKER_PLANES, TRANS_PASS_BEGIN_WORD, TRANS_PASS_FLUSH_WORD};
