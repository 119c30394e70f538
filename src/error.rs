use thiserror::Error;

/// Failures talking to the store. Always fatal for the invocation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid timestamp {raw:?} stored for {name:?}: {source}")]
    Timestamp {
        name: String,
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Problems with user input that only skip the offending item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unable to parse season or episode for \"{name}\". Season: {season} Episode: {episode}")]
    BadEpisode {
        name: String,
        season: String,
        episode: String,
    },

    #[error("wrong number of arguments supplied: {supplied}, need a multiple of 3")]
    OrphanArguments { supplied: usize },

    #[error("invalid duration {0:?}")]
    BadDuration(String),
}
