/// Default unqualified identifier length limit (`NAMEDATALEN - 1`).
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

/// Access method of append-optimized column-oriented tables, the only one that takes
/// column encodings out of the box.
pub const DEFAULT_COLUMN_ENCODING_ACCESS_METHOD: &str = "aoco";

/// Storage option used by legacy dumps to pin a child table's name.
pub const DEFAULT_TABLENAME_OPTION: &str = "tablename";

/// Knobs of the partition expansion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionConfig {
    /// Longest unqualified relation name the catalog accepts, in bytes.
    pub max_identifier_length: usize,
    /// Access methods whose children get the merged column encodings. Children using
    /// any other access method keep only the encodings declared on their own element.
    pub column_encoding_access_methods: Vec<String>,
    /// Name of the storage option that overrides a child's generated name.
    pub tablename_option: String,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            column_encoding_access_methods: vec![DEFAULT_COLUMN_ENCODING_ACCESS_METHOD.to_string()],
            tablename_option: DEFAULT_TABLENAME_OPTION.to_string(),
        }
    }
}

impl ExpansionConfig {
    pub(crate) fn merges_column_encodings(&self, access_method: Option<&str>) -> bool {
        access_method.is_some_and(|am| {
            self.column_encoding_access_methods
                .iter()
                .any(|candidate| candidate == am)
        })
    }
}
