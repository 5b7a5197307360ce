pub mod combinations;
pub mod newtype_index;
