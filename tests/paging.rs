use std::sync::Arc;

use pagelist::models::responses::ApiResponse;
use pagelist::{
    Comparison, Condition, Filter, MemorySource, PageData, PageParams, PagedResult, PagingConfig,
    Predicate, SortDirection, SqlPredicate, SqlQuery, SqlValue,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
struct Book {
    id: u32,
    title: String,
    in_stock: bool,
}

fn catalog() -> MemorySource<Book> {
    (1..=25)
        .map(|id| Book {
            id,
            title: format!("Book {id}"),
            in_stock: id % 3 != 0,
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn query_string_to_response() {
    init_tracing();

    let config = PagingConfig {
        default_page_size: 10,
        max_page_size: 20,
    };
    let params: PageParams = serde_json::from_str(r#"{"page":2}"#).unwrap();
    let request = config.resolve(&params).unwrap();

    let in_stock = Predicate::new().and(|b: &Book| b.in_stock).into_filter();
    let page = PagedResult::from_request(request, &catalog(), &in_stock)
        .await
        .unwrap();

    // 25 books, every third one sold out
    assert_eq!(page.total_count(), 17);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_previous_page());
    assert!(!page.has_next_page());
    assert_eq!(page.len(), 7);
    assert_eq!(page.items()[0].id, 16);

    let response: ApiResponse<'_, Vec<Book>> = page.into();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["meta"]["firstItem"], 11);
    assert_eq!(json["meta"]["lastItem"], 17);
    assert_eq!(json["data"][0]["title"], "Book 16");
}

#[tokio::test]
async fn walking_every_page_visits_every_row_once() {
    let source = catalog();
    let mut seen = Vec::new();
    let params = PageParams {
        page: None,
        page_size: Some(4),
    };
    let mut request = Some(PagingConfig::default().resolve(&params).unwrap());

    while let Some(current) = request {
        let page = PagedResult::from_request(current, &source, &Filter::None)
            .await
            .unwrap();
        request = page.next_page();
        seen.extend(page.into_iter().map(|b| b.id));
    }

    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn concurrent_callers_share_a_source() {
    let source = Arc::new(catalog());

    let handles: Vec<_> = (1..=3)
        .map(|index| {
            let source = Arc::clone(&source);
            tokio::spawn(async move {
                PagedResult::create(index, 10, source.as_ref(), &Filter::None)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut lens = Vec::new();
    for handle in handles {
        lens.push(handle.await.unwrap().len());
    }

    assert_eq!(lens, [10, 10, 5]);
}

#[tokio::test]
async fn carrier_survives_mapping() {
    let page = PagedResult::create(3, 10, &catalog(), &Filter::None)
        .await
        .unwrap();

    let data: PageData<String> = page.clone().map(|b| b.title).into();
    assert!(data.has_previous_page);
    assert!(!data.has_next_page);

    let rebuilt = data.into_paged(10).unwrap();
    assert_eq!(rebuilt.total_pages(), page.total_pages());
    assert_eq!(rebuilt.items().last().map(String::as_str), Some("Book 25"));
}

#[test]
fn conditions_from_wire_operators() {
    // A handler mapping `?field=age&op=ge&value=18` onto a condition
    fn parse(field: &str, op: &str, value: &str) -> Option<Condition> {
        let op = match op {
            "eq" => Comparison::Eq,
            "ge" => Comparison::Ge,
            "like" => Comparison::Like,
            _ => return None,
        };
        let value = match value.parse::<i64>() {
            Ok(n) => SqlValue::Int(n),
            Err(_) => SqlValue::Text(value.to_owned()),
        };
        Some(Condition::compare(field, op, value))
    }

    assert_eq!(parse("age", "ge", "18"), Some(Condition::ge("age", 18)));
    assert_eq!(parse("name", "like", "B%"), Some(Condition::like("name", "B%")));
    assert_eq!(parse("age", "between", "1"), None);

    let filter = SqlPredicate::new()
        .and(parse("age", "ge", "18").unwrap())
        .into_filter();
    let sql = SqlQuery::new("people")
        .order_by("id", SortDirection::Asc)
        .count_sql(&filter)
        .unwrap();
    assert_eq!(sql.sql(), "SELECT COUNT(*) FROM people WHERE age >= $1");
}
