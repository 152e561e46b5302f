//! Collections served by the API and their list configuration.

use crate::config::ListingConfig;
use crate::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use fittrack_query::{Condition, FilterQuery, ListQueryOptions, PaginationOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Goals,
    Workouts,
    Exercises,
}

/// A reference from one document to others, expanded on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub field: &'static str,
    pub target: EntityKind,
    /// `true` when the field holds an array of ids.
    pub many: bool,
}

const GOAL_RELATIONS: &[Relation] = &[Relation {
    field: "user",
    target: EntityKind::Users,
    many: false,
}];

const WORKOUT_RELATIONS: &[Relation] = &[
    Relation {
        field: "user",
        target: EntityKind::Users,
        many: false,
    },
    Relation {
        field: "exercises",
        target: EntityKind::Exercises,
        many: true,
    },
];

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Users,
        EntityKind::Goals,
        EntityKind::Workouts,
        EntityKind::Exercises,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Goals => "goals",
            EntityKind::Workouts => "workouts",
            EntityKind::Exercises => "exercises",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.collection() == name)
    }

    pub fn allowed_filters(self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["name", "email", "role", "age"],
            EntityKind::Goals => &["user", "category", "status", "unit", "targetValue", "progress"],
            EntityKind::Workouts => &["user", "type", "rating", "durationMinutes", "caloriesBurned"],
            EntityKind::Exercises => &["muscleGroup", "category", "equipment", "name"],
        }
    }

    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["name", "email"],
            EntityKind::Goals => &["title", "description"],
            EntityKind::Workouts => &["name", "notes"],
            EntityKind::Exercises => &["name", "description", "muscleGroup"],
        }
    }

    pub fn relations(self) -> &'static [Relation] {
        match self {
            EntityKind::Goals => GOAL_RELATIONS,
            EntityKind::Workouts => WORKOUT_RELATIONS,
            EntityKind::Users | EntityKind::Exercises => &[],
        }
    }

    /// Fields that must be unique (case-insensitively) within the collection.
    pub fn unique_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["email"],
            EntityKind::Exercises => &["name"],
            EntityKind::Goals | EntityKind::Workouts => &[],
        }
    }

    fn index(self) -> usize {
        match self {
            EntityKind::Users => 0,
            EntityKind::Goals => 1,
            EntityKind::Workouts => 2,
            EntityKind::Exercises => 3,
        }
    }

    fn list_options(self, listing: &ListingConfig) -> Result<ListQueryOptions> {
        let options = ListQueryOptions::new()
            .allow(self.allowed_filters().iter().copied())?
            .search_fields(self.search_fields().iter().copied())
            .default_sort(&listing.default_sort)?
            .limits(listing.default_limit, Some(listing.max_limit))?;

        let options = match self {
            EntityKind::Users => options
                .special("email", user_email)?
                .special("joinedAfter", joined_after)?,
            EntityKind::Goals => options
                .special("active", goals_active)?
                .special("deadlineBefore", deadline_before)?,
            EntityKind::Workouts => options
                .special("date", workout_date)?
                .special("minRating", min_rating)?,
            EntityKind::Exercises => options,
        };
        Ok(options)
    }
}

/// Timestamp format of `createdAt`; lexical order equals time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// `joinedAfter=2024-01-01` or a full RFC 3339 instant.
pub fn joined_after(raw: &str) -> FilterQuery {
    let since = match parse_day(raw) {
        Some(day) => day.and_hms_opt(0, 0, 0).map(|at| at.and_utc()),
        None => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
    };
    match since {
        Some(at) => FilterQuery::new().with("createdAt", Condition::gte(format_timestamp(at))),
        None => FilterQuery::new(),
    }
}

/// Emails are stored lowercased, so the bare `email` filter is too.
/// `email[ne]` and `email[in]` still go through the allow-list unchanged.
pub fn user_email(raw: &str) -> FilterQuery {
    match raw.trim() {
        "" => FilterQuery::new(),
        email => FilterQuery::new().with("email", Condition::eq(email.to_lowercase())),
    }
}

/// `active=true` selects open goals, `active=false` closed ones.
pub fn goals_active(raw: &str) -> FilterQuery {
    let statuses = match raw.trim() {
        "true" | "1" => ["not-started", "in-progress"],
        "false" | "0" => ["completed", "abandoned"],
        _ => return FilterQuery::new(),
    };
    FilterQuery::new().with("status", Condition::one_of(statuses))
}

pub fn deadline_before(raw: &str) -> FilterQuery {
    match parse_day(raw) {
        Some(day) => FilterQuery::new().with("deadline", Condition::lt(day.to_string())),
        None => FilterQuery::new(),
    }
}

/// `date=2024-05-01` for one day, `date=2024-05-01..2024-05-31` for an inclusive span.
pub fn workout_date(raw: &str) -> FilterQuery {
    match raw.split_once("..") {
        Some((from, to)) => match (parse_day(from), parse_day(to)) {
            (Some(from), Some(to)) => FilterQuery::new()
                .with("date", Condition::gte(from.to_string()))
                .with("date", Condition::lte(to.to_string())),
            _ => FilterQuery::new(),
        },
        None => match parse_day(raw) {
            Some(day) => FilterQuery::new().with("date", Condition::eq(day.to_string())),
            None => FilterQuery::new(),
        },
    }
}

pub fn min_rating(raw: &str) -> FilterQuery {
    match raw.trim().parse::<i64>() {
        Ok(rating) => FilterQuery::new().with("rating", Condition::gte(rating)),
        Err(_) => FilterQuery::new(),
    }
}

/// List configuration for every collection, built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    options: [ListQueryOptions; 4],
    pagination: PaginationOptions,
}

impl Catalog {
    pub fn new(listing: &ListingConfig) -> Result<Self> {
        Ok(Self {
            options: [
                EntityKind::Users.list_options(listing)?,
                EntityKind::Goals.list_options(listing)?,
                EntityKind::Workouts.list_options(listing)?,
                EntityKind::Exercises.list_options(listing)?,
            ],
            pagination: PaginationOptions {
                default_limit: listing.default_limit,
                max_limit: Some(listing.max_limit),
                total_docs: None,
            },
        })
    }

    pub fn list_options(&self, entity: EntityKind) -> &ListQueryOptions {
        &self.options[entity.index()]
    }

    pub fn pagination(&self) -> PaginationOptions {
        self.pagination
    }

    /// `(collection, fields)` pairs for stores that enforce uniqueness themselves.
    pub fn unique_fields(&self) -> impl Iterator<Item = (&'static str, Vec<&'static str>)> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| !kind.unique_fields().is_empty())
            .map(|kind| (kind.collection(), kind.unique_fields().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fittrack_query::{Bound, RangeOp};

    #[test]
    fn collections_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_collection(kind.collection()), Some(kind));
        }
        assert_eq!(EntityKind::from_collection("sessions"), None);
    }

    #[test]
    fn joined_after_accepts_days_and_instants() {
        assert_eq!(
            joined_after("2024-01-01").get("createdAt"),
            Some(&Condition::gte("2024-01-01T00:00:00.000Z"))
        );
        assert_eq!(
            joined_after("2024-01-01T12:30:00+02:00").get("createdAt"),
            Some(&Condition::gte("2024-01-01T10:30:00.000Z"))
        );
        assert!(joined_after("last week").is_empty());
    }

    #[test]
    fn email_filter_is_lowercased() {
        assert_eq!(
            user_email(" Ada@Example.com ").get("email"),
            Some(&Condition::eq("ada@example.com"))
        );
        assert!(user_email("  ").is_empty());
    }

    #[test]
    fn active_maps_to_statuses() {
        assert_eq!(
            goals_active("true").get("status"),
            Some(&Condition::one_of(["not-started", "in-progress"]))
        );
        assert_eq!(
            goals_active("false").get("status"),
            Some(&Condition::one_of(["completed", "abandoned"]))
        );
        assert!(goals_active("maybe").is_empty());
    }

    #[test]
    fn workout_date_single_day_and_span() {
        assert_eq!(
            workout_date("2024-05-01").get("date"),
            Some(&Condition::eq("2024-05-01"))
        );
        assert_eq!(
            workout_date("2024-05-01..2024-05-31").get("date"),
            Some(&Condition::Range(vec![
                Bound {
                    op: RangeOp::Gte,
                    value: "2024-05-01".into(),
                },
                Bound {
                    op: RangeOp::Lte,
                    value: "2024-05-31".into(),
                },
            ]))
        );
        assert!(workout_date("2024-05-01..soon").is_empty());
        assert!(min_rating("high").is_empty());
        assert!(deadline_before("2024-13-01").is_empty());
    }

    #[test]
    fn catalog_applies_listing_limits() {
        let listing = ListingConfig {
            default_limit: 20,
            max_limit: 50,
            default_sort: "name".to_string(),
        };
        let catalog = Catalog::new(&listing).unwrap();
        let options = catalog.list_options(EntityKind::Workouts);
        assert_eq!(options.default_limit, 20);
        assert_eq!(options.max_limit, Some(50));
        assert_eq!(options.default_sort.to_string(), "name");
        assert!(options.special_filters.contains("minRating"));
        assert!(options.allowed_filters.contains("type"));
        assert_eq!(catalog.pagination().max_limit, Some(50));
        assert_eq!(catalog.unique_fields().count(), 2);
    }
}
