//! JSON to XML serialization.

mod sanitize;
mod serializer;

pub use sanitize::sanitize;
pub use serializer::{
  envelope, serialize_array, serialize_object, to_document_string, DOCUMENT_PREFIX,
  DOCUMENT_SUFFIX, ITEM_NAME, LIST_ITEMS_NAME,
};
