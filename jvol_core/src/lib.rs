pub mod bitio;
pub mod blocks;
pub mod casting;
pub mod codec;
pub mod dct;
pub mod entropy;
pub mod error;
pub mod format;
pub mod huffman;
pub mod payload;
pub mod pipeline;
pub mod quant;
pub mod reader;
pub mod rle;
pub mod scan;
pub mod volume;
pub mod writer;

pub use codec::SectionCodec;
pub use entropy::HuffmanCoding;
pub use error::{JvolError, Result};
pub use format::{JvolHeader, SectionEntry, HEADER_SIZE, MAGIC};
pub use huffman::HuffmanTable;
pub use payload::{AffineRows, JvolPayload};
pub use pipeline::{decode_array, encode_array, normalized_span, EncodedArray, NORMALIZED_MAX};
pub use quant::{quantization_table, QuantizationTable};
pub use reader::{peek_header, Reader};
pub use rle::RunLength;
pub use volume::{Dtype, Element, Volume, VolumeData};
pub use writer::Writer;
