//! Ordering of open pickups for collectors.

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use super::{Collection, CollectionStatus, Coordinate, UserId};

/// Location a collector supplied with a ranking request.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorLocation {
    /// No location given.
    Absent,
    /// A usable coordinate.
    Valid(Coordinate),
    /// Something was given but it could not be used.
    Malformed(String),
}

impl CollectorLocation {
    /// Interpret raw query values. Blank values count as missing; exactly one
    /// missing component is malformed.
    ///
    /// # Examples
    /// ```
    /// use reciclai::domain::CollectorLocation;
    ///
    /// assert_eq!(CollectorLocation::from_query(None, None), CollectorLocation::Absent);
    /// assert!(matches!(
    ///     CollectorLocation::from_query(Some("-23.55"), Some("abc")),
    ///     CollectorLocation::Malformed(_)
    /// ));
    /// ```
    #[must_use]
    pub fn from_query(latitude: Option<&str>, longitude: Option<&str>) -> Self {
        fn present(raw: Option<&str>) -> Option<&str> {
            raw.filter(|value| !value.trim().is_empty())
        }

        match (present(latitude), present(longitude)) {
            (None, None) => Self::Absent,
            (Some(lat), Some(lon)) => match Coordinate::parse(lat, lon) {
                Ok(coordinate) => Self::Valid(coordinate),
                Err(err) => Self::Malformed(err.to_string()),
            },
            (Some(_), None) => Self::Malformed("longitude is missing".to_owned()),
            (None, Some(_)) => Self::Malformed("latitude is missing".to_owned()),
        }
    }
}

/// Non-fatal problem reported alongside a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RankingWarning {
    /// The location was unusable; results use time ordering instead.
    MalformedInput { message: String },
}

/// One open collection with its distance from the collector, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCollection {
    pub collection: Collection,
    pub distance_km: Option<f64>,
}

/// Ranked open collections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    pub entries: Vec<RankedCollection>,
    pub warning: Option<RankingWarning>,
}

/// Dispatch ordering rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchRanker;

impl DispatchRanker {
    /// Rank collections still in `Requested`.
    ///
    /// Without a location the oldest request comes first. With one, the
    /// nearest comes first and creation time breaks ties. A malformed
    /// location falls back to time ordering and yields a warning.
    #[must_use]
    pub fn rank_open(collections: Vec<Collection>, location: &CollectorLocation) -> Ranking {
        let open = collections
            .into_iter()
            .filter(|collection| collection.status() == CollectionStatus::Requested);

        let (mut entries, warning): (Vec<_>, _) = match location {
            CollectorLocation::Valid(origin) => (
                open.map(|collection| RankedCollection {
                    distance_km: Some(origin.distance_km(&collection.location())),
                    collection,
                })
                .collect(),
                None,
            ),
            CollectorLocation::Absent => (open.map(Self::unranked).collect(), None),
            CollectorLocation::Malformed(message) => (
                open.map(Self::unranked).collect(),
                Some(RankingWarning::MalformedInput {
                    message: message.clone(),
                }),
            ),
        };

        entries.sort_by(|a, b| {
            let by_distance = match (a.distance_km, b.distance_km) {
                (Some(left), Some(right)) => left.total_cmp(&right),
                _ => Ordering::Equal,
            };
            by_distance.then_with(|| a.collection.created_at().cmp(&b.collection.created_at()))
        });
        Ranking { entries, warning }
    }

    /// Collections `collector` currently holds, most recently updated first.
    #[must_use]
    pub fn active_for(collections: Vec<Collection>, collector: UserId) -> Vec<Collection> {
        let mut active: Vec<_> = collections
            .into_iter()
            .filter(|collection| {
                collection.collector_id() == Some(collector)
                    && CollectionStatus::ACTIVE.contains(&collection.status())
            })
            .collect();
        active.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        active
    }

    const fn unranked(collection: Collection) -> RankedCollection {
        RankedCollection {
            collection,
            distance_km: None,
        }
    }
}
