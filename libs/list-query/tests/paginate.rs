use async_trait::async_trait;
use fittrack_query::{
    paginate_results, process_query, Condition, FindQuery, ListQueryOptions, ListRequest, Model,
    PageLink, PaginateOptions, PaginationOptions, Query,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
#[error("store offline")]
struct Offline;

/// In-process model over JSON workouts that understands equality filters and
/// single-key sorts, enough to exercise the full cycle.
struct Workouts {
    rows: Vec<Value>,
    offline: bool,
    seen: Mutex<Vec<FindQuery>>,
}

impl Workouts {
    fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            offline: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn matching(&self, query: &Query) -> Vec<Value> {
        self.rows
            .iter()
            .filter(|row| match query.filter() {
                None => true,
                Some(filter) => filter.iter().all(|(field, condition)| match condition {
                    Condition::Eq(v) => &row[field] == v,
                    _ => true,
                }),
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Model for Workouts {
    type Record = Value;
    type Error = Offline;

    async fn count(&self, query: &Query) -> Result<u64, Offline> {
        if self.offline {
            return Err(Offline);
        }
        Ok(self.matching(query).len() as u64)
    }

    async fn find(&self, find: &FindQuery) -> Result<Vec<Value>, Offline> {
        if self.offline {
            return Err(Offline);
        }
        self.seen.lock().unwrap().push(find.clone());

        let mut rows = self.matching(find.conditions());
        if let Some(key) = find.sort_spec().and_then(|s| s.keys().first()) {
            rows.sort_by_key(|row| row[key.field.as_str()].as_i64().unwrap_or_default());
            if !key.ascending() {
                rows.reverse();
            }
        }
        Ok(rows
            .into_iter()
            .skip(find.offset() as usize)
            .take(find.max_results().unwrap_or(u64::MAX) as usize)
            .collect())
    }
}

fn workouts(strength: usize, cardio: usize) -> Vec<Value> {
    let strength = (0..strength).map(|i| json!({"type": "strength", "rating": i}));
    let cardio = (0..cardio).map(|i| json!({"type": "cardio", "rating": i}));
    strength.chain(cardio).collect()
}

fn options() -> ListQueryOptions {
    ListQueryOptions::new()
        .allow(["type", "rating"])
        .unwrap()
        .search_fields(["name"])
}

#[tokio::test]
async fn second_page_of_filtered_sorted_workouts() -> anyhow::Result<()> {
    let model = Workouts::new(workouts(12, 7));
    let request = ListRequest::from_query("page=2&limit=5&sort=-rating&type=strength");
    let processed = process_query(&request, &options());

    let paginate = PaginateOptions::new(PaginationOptions::default())
        .sort(processed.sort.clone())
        .populate(["user", "exercises"]);
    let response = paginate_results(&request, &model, &processed.query, &paginate).await?;

    assert!(response.success);
    assert_eq!(response.count, 5);
    assert_eq!(response.pagination.total, Some(12));
    assert_eq!(response.pagination.pages, Some(3));
    assert_eq!(response.pagination.next, Some(PageLink { page: 3, limit: 5 }));
    assert_eq!(response.pagination.prev, Some(PageLink { page: 1, limit: 5 }));

    let ratings: Vec<i64> = response
        .data
        .iter()
        .map(|row| row["rating"].as_i64().unwrap())
        .collect();
    assert_eq!(ratings, vec![6, 5, 4, 3, 2]);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0].relations(), &["user".to_string(), "exercises".to_string()]);
    assert_eq!((seen[0].offset(), seen[0].max_results()), (5, Some(5)));
    Ok(())
}

#[tokio::test]
async fn envelope_serializes_with_camel_case_keys() -> anyhow::Result<()> {
    let model = Workouts::new(workouts(25, 0));
    let request = ListRequest::from_query("page=3");
    let response = paginate_results(&request, &model, &Query::All, &PaginateOptions::default()).await?;

    let body = serde_json::to_value(&response)?;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], json!(5));
    assert_eq!(
        body["pagination"],
        json!({
            "page": 3,
            "limit": 10,
            "startIndex": 20,
            "endIndex": 30,
            "prev": {"page": 2, "limit": 10},
            "total": 25,
            "pages": 3
        })
    );
    Ok(())
}

#[tokio::test]
async fn empty_collection_returns_empty_page() -> anyhow::Result<()> {
    let model = Workouts::new(Vec::new());
    let response = paginate_results(
        &ListRequest::default(),
        &model,
        &Query::All,
        &PaginateOptions::default(),
    )
    .await?;

    assert_eq!(response.count, 0);
    assert!(response.data.is_empty());
    assert_eq!(response.pagination.pages, Some(0));
    assert_eq!(response.pagination.next, None);
    Ok(())
}

#[tokio::test]
async fn store_errors_propagate() {
    let mut model = Workouts::new(workouts(3, 0));
    model.offline = true;

    let result = paginate_results(
        &ListRequest::default(),
        &model,
        &Query::All,
        &PaginateOptions::default(),
    )
    .await;
    assert!(matches!(result, Err(Offline)));
}
