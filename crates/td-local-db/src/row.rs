//! Row decoding helpers shared by the stores.

use chrono::NaiveDateTime;
use rusqlite::types::Type;

use td_core::moment;
use td_core::Visibility;

/// Decode a stored visibility column.
pub(crate) fn visibility_from_sql(value: String) -> rusqlite::Result<Visibility> {
    Visibility::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("unknown visibility: {value}").into(),
        )
    })
}

/// Decode a stored datetime column.
pub(crate) fn datetime_from_sql(value: String) -> rusqlite::Result<NaiveDateTime> {
    moment::parse_dt(&value).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, err.to_string().into())
    })
}

/// Decode an optional stored datetime column.
pub(crate) fn optional_datetime_from_sql(
    value: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    value.map(datetime_from_sql).transpose()
}
