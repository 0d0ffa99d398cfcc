pub mod spectra;

pub use spectra::{read_spectra_csv, read_spectra_with_config, SpectraReaderConfig};
