use clap::ValueEnum;
use dashboard_core::DataFormat;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum InputFormat {
    Csv,
    Parquet,
    Json,
}

impl From<InputFormat> for DataFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Csv => DataFormat::Csv,
            InputFormat::Parquet => DataFormat::Parquet,
            InputFormat::Json => DataFormat::Json,
        }
    }
}
