pub mod arrays;
pub mod buffer;
pub mod config;
pub mod expr;
pub mod frame;
pub mod lazy;
pub mod testutil;

pub mod prelude {
    //! Commonly used types and functions.

    pub use crate::arrays::chunked_array::{
        BooleanChunked, ChunkedArray, FillNoneStrategy, Float32Chunked, Float64Chunked,
        Int8Chunked, Int16Chunked, Int32Chunked, Int64Chunked, ListChunked, UInt8Chunked,
        UInt16Chunked, UInt32Chunked, UInt64Chunked, Utf8Chunked,
    };
    pub use crate::arrays::datatype::DataType;
    pub use crate::arrays::scalar::ScalarValue;
    pub use crate::arrays::series::{NamedFrom, Series};
    pub use crate::config::ExecutionConfig;
    pub use crate::expr::{AggKind, Expr, Operator, col, lit, lit_null, when};
    pub use crate::frame::join::JoinType;
    pub use crate::frame::DataFrame;
    pub use crate::lazy::LazyFrame;
}
