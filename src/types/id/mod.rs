use once_cell::sync::Lazy;
use serde::de::{Error as DeError, Unexpected};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

use self::marker::Marker;

pub mod marker;

/// Opaque identifier for one kind of entity. The marker keeps a
/// channel id from being passed where a user id is expected while
/// the wire and database representation stays a plain UUID.
pub struct Id<T: Marker> {
    value: Uuid,
    phantom: PhantomData<T>,
}

impl<T: Marker> Id<T> {
    #[must_use]
    pub const fn from_uuid(value: Uuid) -> Self {
        Self {
            value,
            phantom: PhantomData,
        }
    }

    /// Generates a fresh random (v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    #[must_use]
    pub const fn get(self) -> Uuid {
        self.value
    }

    #[must_use]
    pub const fn cast<M: Marker>(self) -> Id<M> {
        Id {
            value: self.value,
            phantom: PhantomData,
        }
    }
}

impl<T: Marker> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T: Marker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Marker> Copy for Id<T> {}

impl<T: Marker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Marker> Eq for Id<T> {}

impl<T: Marker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Marker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: Marker> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use heck::ToSnakeCase;
        static MARKER_MODULE: Lazy<String> = Lazy::new(|| {
            format!(
                "{}::types::id::marker::",
                env!("CARGO_PKG_NAME").to_snake_case()
            )
        });

        // This is to assume that all ID markers are defined in `marker` module
        let type_name = std::any::type_name::<T>();
        let type_name = if type_name.starts_with(&*MARKER_MODULE) {
            type_name.split("::").last().unwrap_or(type_name)
        } else {
            type_name
        };
        write!(f, "Id::<{type_name}>({})", self.value)
    }
}

impl<T: Marker> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl<T: Marker> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<'de, T: Marker> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor<T: Marker>(PhantomData<T>);

        impl<'de, T: Marker> serde::de::Visitor<'de> for Visitor<T> {
            type Value = Id<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a UUID string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                let value = Uuid::parse_str(v)
                    .map_err(|_| DeError::invalid_value(Unexpected::Str(v), &"UUID string"))?;

                Ok(Id::<T>::from_uuid(value))
            }
        }

        deserializer.deserialize_str(Visitor(PhantomData))
    }
}

impl<T: Marker> serde::Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.value)
    }
}

impl<'q, T: Marker> sqlx::Encode<'q, sqlx::Postgres> for Id<T> {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <Uuid as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.value, buf)
    }
}

impl<'r, T: Marker> sqlx::Decode<'r, sqlx::Postgres> for Id<T> {
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <Uuid as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(Self::from_uuid(value))
    }
}

impl<T: Marker> sqlx::Type<sqlx::Postgres> for Id<T> {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::marker::AnyMarker;
    use serde_test::Token;
    use static_assertions::{assert_eq_size, assert_impl_all};

    assert_eq_size!(Id<AnyMarker>, Uuid);
    assert_impl_all!(Id<AnyMarker>:
        Debug, Display, Clone, Copy, Send, Sync, Hash, sqlx::Decode<'static, sqlx::Postgres>,
        sqlx::Encode<'static, sqlx::Postgres>, sqlx::Type<sqlx::Postgres>
    );

    const SAMPLE: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    fn sample() -> Id<AnyMarker> {
        SAMPLE.parse().unwrap()
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<Id<AnyMarker>>().is_err());
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(Id::<AnyMarker>::generate(), Id::<AnyMarker>::generate());
    }

    #[test]
    fn test_fmt_display_impl() {
        assert_eq!(SAMPLE, sample().to_string());
    }

    #[test]
    fn test_fmt_debug_impl() {
        assert_eq!(
            format!("Id::<AnyMarker>({SAMPLE})"),
            format!("{:?}", sample())
        );
    }

    #[test]
    fn test_serde_impl() {
        let id = sample();
        serde_test::assert_tokens(&id, &[Token::Str(SAMPLE)]);
    }
}
