pub(crate) mod base16;
pub(crate) mod base64;
pub(crate) mod case;
