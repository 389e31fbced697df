use clap::builder::TypedValueParser as _;
use partgen::{
    DEFAULT_COLUMN_ENCODING_ACCESS_METHOD, DEFAULT_MAX_IDENTIFIER_LENGTH, DEFAULT_TABLENAME_OPTION,
    ExpansionConfig,
};

/// Configuration of legacy partition expansion.
#[derive(Debug, clap::Parser, Clone)]
pub struct PartitionExpansionConfig {
    /// Longest name, in bytes, a generated partition may have. Generated names are
    /// shortened to fit; explicit `tablename` overrides that do not fit are rejected.
    #[clap(
        long = "partition-max-identifier-length",
        env = "PARTGEN_MAX_IDENTIFIER_LENGTH",
        default_value_t = DEFAULT_MAX_IDENTIFIER_LENGTH,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from),
        action
    )]
    pub max_identifier_length: usize,

    /// Comma-separated access methods whose partitions receive the column encodings
    /// declared on the table and the partition configuration.
    #[clap(
        long = "partition-column-encoding-access-methods",
        env = "PARTGEN_COLUMN_ENCODING_ACCESS_METHODS",
        default_value = DEFAULT_COLUMN_ENCODING_ACCESS_METHOD,
        value_delimiter = ',',
        action
    )]
    pub column_encoding_access_methods: Vec<String>,

    /// Storage option that names a partition verbatim, as written by legacy dumps.
    #[clap(
        long = "partition-tablename-option",
        env = "PARTGEN_TABLENAME_OPTION",
        default_value = DEFAULT_TABLENAME_OPTION,
        action
    )]
    pub tablename_option: String,
}

impl From<PartitionExpansionConfig> for ExpansionConfig {
    fn from(config: PartitionExpansionConfig) -> Self {
        Self {
            max_identifier_length: config.max_identifier_length,
            column_encoding_access_methods: config
                .column_encoding_access_methods
                .into_iter()
                .map(|am| am.trim().to_string())
                .filter(|am| !am.is_empty())
                .collect(),
            tablename_option: config.tablename_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test_log::test]
    fn defaults_match_engine_defaults() {
        let config: ExpansionConfig = PartitionExpansionConfig::parse_from([""]).into();
        assert_eq!(config, ExpansionConfig::default());
    }

    #[test_log::test]
    fn flags() {
        let config: ExpansionConfig = PartitionExpansionConfig::parse_from([
            "",
            "--partition-max-identifier-length",
            "127",
            "--partition-column-encoding-access-methods",
            "aoco, columnar",
            "--partition-tablename-option",
            "relname",
        ])
        .into();
        assert_eq!(config.max_identifier_length, 127);
        assert_eq!(
            config.column_encoding_access_methods,
            vec!["aoco".to_string(), "columnar".to_string()]
        );
        assert_eq!(config.tablename_option, "relname");
    }

    #[test]
    fn zero_length_is_rejected() {
        let err = PartitionExpansionConfig::try_parse_from([
            "",
            "--partition-max-identifier-length",
            "0",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
