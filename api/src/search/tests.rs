use super::*;
use catalog_common::{ExpressionValue, FieldType, FilterExpression, Operator, QueryField};
use serde_json::json;

fn catalog() -> InMemorySearchClient {
    let docs = json!([
        {"id": 1, "sku": "ABC-1", "name": "Red shirt", "color": "red", "price": 10.0, "category_ids": ["4", "7"]},
        {"id": 2, "sku": "ABC-2", "name": "Blue shirt", "color": "blue", "price": 25.5, "category_ids": ["4"]},
        {"id": 3, "sku": "XYZ-3", "name": "Red trousers", "color": "red", "price": 40.0, "category_ids": ["8"]},
        {"id": 4, "sku": "XYZ-4", "name": "Green socks", "color": "green", "price": 3.0}
    ]);
    InMemorySearchClient::from_json(&docs.to_string()).unwrap()
}

fn ids(response: &SearchResponse) -> Vec<String> {
    response
        .documents()
        .iter()
        .filter_map(|d| d.get_string("id"))
        .collect()
}

fn color(value: &str) -> FilterExpression {
    FilterExpression::eq("color", QueryField::string("color"), value)
}

#[test]
fn test_add_fields_to_select_dedups() {
    let mut query = SearchQuery::new();
    query
        .add_fields_to_select(["id", "sku", "id", ""])
        .add_fields_to_select(vec!["sku".to_string(), "name".to_string()]);
    assert_eq!(query.fields(), ["id", "sku", "name"]);
}

#[test]
fn test_filter_clauses_and_sort_clause() {
    let mut query = SearchQuery::new();
    query
        .add_filter(color("red"))
        .add_filters(vec![vec![color("blue"), color("green")], vec![]])
        .add_sort("score", SortDirection::Desc)
        .add_sort("id", SortDirection::Asc);
    assert_eq!(
        query.filter_clauses(),
        vec!["color:red", "(color:blue OR color:green)"]
    );
    assert_eq!(query.sort_clause(), "score desc,id asc");
}

#[test]
fn test_paging() {
    let mut query = SearchQuery::new();
    query.set_page_size(2).set_current_page(0);
    assert_eq!(query.current_page(), 1);
    assert_eq!(query.offset(), 0);
    query.set_current_page(3);
    assert_eq!(query.offset(), 4);

    let client = catalog();
    let mut query = SearchQuery::new();
    query
        .set_page_size(3)
        .set_current_page(2)
        .add_sort("id", SortDirection::Asc);
    let response = client.search(&query);
    assert_eq!(response.total_found(), 4);
    assert_eq!(ids(&response), vec!["4"]);
}

#[test]
fn test_groups_and_within_or_across() {
    let client = catalog();
    let mut query = SearchQuery::new();
    query.add_filters(vec![vec![color("red"), color("green")]]);
    query.add_filter(FilterExpression::new(
        "price",
        QueryField::new("price", FieldType::Float),
        Operator::Range,
        ExpressionValue::normalized_range("5", "50").unwrap(),
    ));
    query.add_sort("id", SortDirection::Asc);
    assert_eq!(ids(&client.search(&query)), vec!["1", "3"]);
}

#[test]
fn test_non_finite_values_compare_as_text() {
    let docs = json!([
        {"id": 1, "price": "NaN"},
        {"id": 2, "price": 9},
        {"id": 3, "price": "inf"}
    ]);
    let client = InMemorySearchClient::from_json(&docs.to_string()).unwrap();
    let price = QueryField::new("price", FieldType::Float);

    let mut query = SearchQuery::new();
    query.add_filter(FilterExpression::eq("price", price.clone(), "5"));
    assert_eq!(client.search(&query).total_found(), 0);

    let mut query = SearchQuery::new();
    query.add_filter(FilterExpression::new(
        "price",
        price,
        Operator::Range,
        ExpressionValue::half_open_from(catalog_common::Number::Int(1)),
    ));
    assert_eq!(ids(&client.search(&query)), vec!["2"]);
}

#[test]
fn test_in_and_multivalued_fields() {
    let client = catalog();
    let mut query = SearchQuery::new();
    query.add_filter(FilterExpression::new(
        "category_ids",
        QueryField::string("category_ids").multivalued(),
        Operator::In,
        ExpressionValue::List(vec!["7".to_string(), "8".to_string()]),
    ));
    query.add_sort("id", SortDirection::Desc);
    assert_eq!(ids(&client.search(&query)), vec!["3", "1"]);
}

#[test]
fn test_full_text_and_score_sort() {
    let client = catalog();
    let mut query = SearchQuery::new();
    query
        .set_query_text("RED")
        .add_sort("score", SortDirection::Desc)
        .add_sort("id", SortDirection::Asc)
        .add_fields_to_select(["id", "score"]);
    let response = client.search(&query);
    assert_eq!(ids(&response), vec!["1", "3"]);
    assert_eq!(response.documents()[0].get("score"), Some(&json!(2.0)));
    assert!(response.documents()[0].get("sku").is_none());

    query.set_query_text("   ");
    assert_eq!(query.query_text(), None);
}

#[test]
fn test_facets_ignore_excluded_filters_on_their_own_field() {
    let client = catalog();
    let mut query = SearchQuery::new();
    query.add_filter(color("red").excluded_from_facets()).add_facet("color");
    let response = client.search(&query);
    assert_eq!(response.total_found(), 2);
    let colors = &response.facets()["color"];
    assert_eq!(colors["red"], 2);
    assert_eq!(colors["blue"], 1);
    assert_eq!(colors["green"], 1);
    assert_eq!(colors.keys().next().map(String::as_str), Some("red"));
}

#[test]
fn test_stats() {
    let client = catalog();
    let mut query = SearchQuery::new();
    query.add_filter(color("red")).add_stat("price").add_stat("price");
    let response = client.search(&query);
    assert_eq!(response.stats().len(), 1);
    let price = &response.stats()["price"];
    assert_eq!(price.min, Some(10.0));
    assert_eq!(price.max, Some(40.0));
    assert_eq!(price.sum, 50.0);
    assert_eq!(price.count, 2);
}

#[test]
fn test_debug_info_and_suggestions() {
    let client = catalog().with_suggestions("shrit", &["shirt"]);
    let mut query = SearchQuery::new();
    query.set_query_text("shrit").add_filter(color("red"));
    let response = client.search(&query);
    assert_eq!(response.total_found(), 0);
    assert_eq!(response.suggestions.len(), 1);
    assert_eq!(response.suggestions[0].word, "shrit");
    assert_eq!(response.suggestions[0].original_frequency, 0);
    assert_eq!(response.suggestions[0].alternatives, vec!["shirt"]);
    assert!(response.debug_info().is_none());

    query.set_debug(true);
    let debug = client.search(&query).debug_info.unwrap();
    assert_eq!(debug["params"]["q"], "shrit");
    assert_eq!(debug["params"]["fq"], json!(["color:red"]));
    assert_eq!(debug["code"], 200);
}

#[tokio::test]
async fn test_execute_through_trait() {
    let client: Box<dyn SearchClient> = Box::new(catalog());
    let mut query = client.new_query();
    query.add_filter(FilterExpression::eq("sku", QueryField::string("sku"), "ABC-1"));
    let response = client.execute(&query).await.unwrap();
    assert_eq!(response.total_found(), 1);
    assert_eq!(
        response.first_document().and_then(|d| d.get_string("name")),
        Some("Red shirt".to_string())
    );
}
