mod common;

use jsonapi_adapter::filter::{FieldCondition, Operator, SortDirection};
use jsonapi_adapter::{AppError, FilterDescriptor, ResourceAdapter, ResourcePayload};
use serde_json::{json, Value};

async fn create(adapter: &ResourceAdapter<'_>, payload: Value) -> Result<Value, AppError> {
    adapter.create_resource(&ResourcePayload::parse(payload).unwrap()).await
}

fn ids(list: &jsonapi_adapter::ResourceList) -> Vec<Value> {
    list.resources.iter().map(|r| r.id.clone()).collect()
}

#[tokio::test]
async fn get_resource_includes_to_one_targets_only() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let article = articles.get_resource(&json!(1)).await.unwrap().unwrap();
    assert_eq!(article.id, json!(1));
    assert_eq!(article.type_name(), "articles");
    assert_eq!(article.attributes["title"], json!("First"));
    assert_eq!(article.attributes["published_at"], json!("2024-01-01T08:00:00+00:00"));
    assert!(!article.attributes.contains_key("summary"));
    assert!(!article.attributes.contains_key("author"));

    let author = article.included.iter().find(|r| r.type_name() == "people").unwrap();
    assert_eq!(author.id, json!(5));
    assert_eq!(author.attributes["name"], json!("Ann"));
    assert!(article.included.iter().all(|r| r.type_name() != "comments"));
    assert_eq!(article.included.len(), 2);
}

#[tokio::test]
async fn missing_row_is_none_on_read_but_an_error_on_update() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    assert!(articles.get_resource(&json!(99)).await.unwrap().is_none());

    let payload = ResourcePayload::parse(json!({ "data": { "attributes": { "title": "x" } } })).unwrap();
    let err = articles.update_resource(&json!(99), &payload).await.unwrap_err();
    assert!(matches!(err, AppError::ObjectNotFound(_)));
}

#[tokio::test]
async fn unknown_collection() {
    let registry = common::registry();
    let store = common::store();
    let err = ResourceAdapter::new(&registry, &store, "tags").err().unwrap();
    assert!(matches!(err, AppError::CollectionNotFound(_)));
}

#[tokio::test]
async fn greater_than_selects_smaller_values() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("views", Operator::GreaterThan, "30"));
    let list = articles.list_resources(&filter).await.unwrap();
    assert_eq!(ids(&list), vec![json!(1)]);

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("views", Operator::LessThan, "30"));
    let list = articles.list_resources(&filter).await.unwrap();
    assert_eq!(ids(&list), vec![json!(2), json!(3)]);
}

#[tokio::test]
async fn filter_values_that_do_not_fit_the_field_are_ignored() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("views", Operator::Equals, "abc"));
    let list = articles.list_resources(&filter).await.unwrap();
    assert_eq!(list.count, 4);

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("published", Operator::Equals, "1"));
    let list = articles.list_resources(&filter).await.unwrap();
    assert_eq!(ids(&list), vec![json!(1)]);
}

#[tokio::test]
async fn is_blank_matches_null_and_empty_only() {
    let registry = common::registry();
    let store = common::store();
    let people = ResourceAdapter::new(&registry, &store, "people").unwrap();

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("email", Operator::IsBlank, ""));
    let list = people.list_resources(&filter).await.unwrap();
    assert_eq!(ids(&list), vec![json!(6), json!(7)]);
    assert_eq!(list.count, 2);

    let filter = FilterDescriptor::default().with_condition(FieldCondition::new("email", Operator::IsPresent, ""));
    let list = people.list_resources(&filter).await.unwrap();
    assert_eq!(ids(&list), vec![json!(5), json!(6)]);
}

#[tokio::test]
async fn search_is_exact_not_substring() {
    let registry = common::registry();
    let store = common::store();
    let people = ResourceAdapter::new(&registry, &store, "people").unwrap();

    let list = people.list_resources(&FilterDescriptor::default().with_search("Doe")).await.unwrap();
    assert_eq!(ids(&list), vec![json!(7)]);

    let list = people.list_resources(&FilterDescriptor::default().with_search("5")).await.unwrap();
    assert_eq!(ids(&list), vec![json!(5)]);
}

#[tokio::test]
async fn textual_operators() {
    let registry = common::registry();
    let store = common::store();
    let people = ResourceAdapter::new(&registry, &store, "people").unwrap();

    let query = |expr: &str| FilterDescriptor::default().with_condition(FieldCondition::parse("name", expr));
    assert_eq!(ids(&people.list_resources(&query("*oh*")).await.unwrap()), vec![json!(6)]);
    assert_eq!(ids(&people.list_resources(&query("*Doe")).await.unwrap()), vec![json!(6), json!(7)]);
    assert_eq!(ids(&people.list_resources(&query("Do*")).await.unwrap()), vec![json!(7)]);
    assert_eq!(ids(&people.list_resources(&query("!Ann")).await.unwrap()), vec![json!(6), json!(7)]);
}

#[tokio::test]
async fn pagination_counts_the_whole_filter() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let list = articles
        .list_resources(&FilterDescriptor::default().with_page(2, Some(2)))
        .await
        .unwrap();
    assert_eq!(ids(&list), vec![json!(3), json!(4)]);
    assert_eq!(list.count, 4);

    let list = articles
        .list_resources(&FilterDescriptor::default().with_sort("views", SortDirection::Desc).with_page(1, None))
        .await
        .unwrap();
    assert_eq!(ids(&list), vec![json!(3)]);
    assert_eq!(list.count, 4);
}

#[tokio::test]
async fn list_resolves_relationships_of_each_resource() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let list = articles.list_resources(&FilterDescriptor::default()).await.unwrap();
    let authors: Vec<Value> = list
        .resources
        .iter()
        .map(|r| r.included.iter().find(|i| i.type_name() == "people").map(|i| i.id.clone()).unwrap_or(Value::Null))
        .collect();
    assert_eq!(authors, vec![json!(5), json!(6), Value::Null, json!(5)]);
}

#[tokio::test]
async fn has_many_lists_children_with_filter() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let list = articles
        .get_has_many(&json!(1), "comments", &FilterDescriptor::default())
        .await
        .unwrap();
    assert_eq!(list.type_name, "comments");
    assert_eq!(ids(&list), vec![json!(1), json!(2)]);
    assert_eq!(list.count, 2);
    assert_eq!(list.resources[0].included[0].type_name(), "articles");

    let page = articles
        .get_has_many(&json!(1), "comments", &FilterDescriptor::default().with_page(1, Some(2)))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![json!(2)]);
    assert_eq!(page.count, 2);

    let none = articles
        .get_has_many(&json!(3), "comments", &FilterDescriptor::default())
        .await
        .unwrap();
    assert!(none.resources.is_empty());
    assert_eq!(none.count, 0);
}

#[tokio::test]
async fn has_many_rejects_bad_associations() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();
    let filter = FilterDescriptor::default();

    let err = articles.get_has_many(&json!(1), "tags", &filter).await.unwrap_err();
    assert!(matches!(err, AppError::AssociationNotFound { ref name, .. } if name == "tags"));

    let err = articles.get_has_many(&json!(1), "author", &filter).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn create_assigns_foreign_keys_and_coerces() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let payload = ResourcePayload::parse(json!({
        "data": {
            "type": "articles",
            "attributes": { "title": "Fifth", "views": "12", "published_at": "2024-02-03" },
            "relationships": {
                "author": { "data": { "type": "people", "id": "5" } },
                "category": { "data": { "type": "blog-categories", "id": "1" } },
                "comments": { "data": [] }
            }
        }
    }))
    .unwrap();
    let id = articles.create_resource(&payload).await.unwrap();
    assert_eq!(id, json!(5));

    let rows = store.rows("articles");
    let row = rows.iter().find(|r| r["id"] == json!(5)).unwrap();
    assert_eq!(row["title"], json!("Fifth"));
    assert_eq!(row["views"], json!(12));
    assert_eq!(row["published_at"], json!("2024-02-03T00:00:00+00:00"));
    assert_eq!(row["author_id"], json!(5));
    assert_eq!(row["category_id"], json!(1));
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();
    let err = create(&articles, json!({ "data": { "attributes": { "nickname": "x" } } })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = create(&articles, json!({ "data": { "attributes": { "views": "many" } } })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = create(&articles, json!({ "data": { "relationships": {
        "author": { "data": { "type": "people", "id": "99" } }
    } } }))
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ObjectNotFound(_)));

    let err = create(&articles, json!({ "data": { "relationships": {
        "tags": { "data": { "type": "tags", "id": "1" } }
    } } }))
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AssociationNotFound { .. }));

    assert_eq!(store.rows("articles").len(), 4);
}

#[tokio::test]
async fn update_ignores_unknown_and_unstored_attributes() {
    let registry = common::registry();
    let store = common::store();
    let articles = ResourceAdapter::new(&registry, &store, "articles").unwrap();

    let payload = ResourcePayload::parse(json!({
        "data": {
            "attributes": { "title": "Second, edited", "summary": "not stored", "nickname": "undeclared" },
            "relationships": { "author": { "data": { "type": "people", "id": "7" } } }
        }
    }))
    .unwrap();
    let id = articles.update_resource(&json!(2), &payload).await.unwrap();
    assert_eq!(id, json!(2));

    let rows = store.rows("articles");
    let row = rows.iter().find(|r| r["id"] == json!(2)).unwrap();
    assert_eq!(row["title"], json!("Second, edited"));
    assert_eq!(row["author_id"], json!(7));
    assert!(!row.contains_key("summary"));
    assert!(!row.contains_key("nickname"));
}
