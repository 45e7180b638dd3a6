mod centavos;

pub mod op;

pub use centavos::{Centavos, CentavosConversionError, PHP_CURRENCY_CODE, PHP_CURRENCY_CODE_LOWER};
