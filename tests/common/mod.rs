#![allow(dead_code)]

use jsonapi_adapter::{resolve, AppState, MemoryStore, SchemaConfig, SchemaRegistry, Store};
use serde_json::json;
use std::sync::Arc;

pub fn registry() -> SchemaRegistry {
    let config: SchemaConfig = serde_json::from_value(json!({
        "collections": [
            {
                "name": "articles",
                "fields": [
                    { "field": "id", "type": "Number" },
                    { "field": "title", "type": "String" },
                    { "field": "body", "type": "String" },
                    { "field": "summary", "type": "String" },
                    { "field": "views", "type": "Number" },
                    { "field": "published", "type": "Boolean" },
                    { "field": "published_at", "type": "Date" },
                    { "field": "author", "type": "Number", "reference": "people", "foreign_key": "author_id" },
                    { "field": "category", "type": "Number", "reference": "blog_categories", "foreign_key": "category_id" },
                    { "field": "comments", "type": "Number", "reference": "comments",
                      "relationship": "to_many", "foreign_key": "article_id" }
                ]
            },
            {
                "name": "people",
                "table": "persons",
                "fields": [
                    { "field": "id", "type": "Number" },
                    { "field": "name", "type": "String" },
                    { "field": "email", "type": "String" }
                ]
            },
            {
                "name": "comments",
                "fields": [
                    { "field": "id", "type": "Number" },
                    { "field": "body", "type": "String" },
                    { "field": "article", "type": "Number", "reference": "articles", "foreign_key": "article_id" }
                ]
            },
            {
                "name": "blog_categories",
                "fields": [
                    { "field": "id", "type": "Number" },
                    { "field": "label", "type": "String" }
                ]
            }
        ]
    }))
    .expect("fixture schema");
    resolve(&config).expect("fixture registry")
}

pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_table(
            "articles",
            &["id", "title", "body", "views", "published", "published_at", "author_id", "category_id"],
            vec![
                json!({ "id": 1, "title": "First", "body": "hello", "views": 10, "published": true,
                        "published_at": "2024-01-01 08:00:00", "author_id": 5, "category_id": 1 }),
                json!({ "id": 2, "title": "Second", "body": "", "views": 50, "published": false,
                        "published_at": null, "author_id": 6, "category_id": null }),
                json!({ "id": 3, "title": "Third", "body": null, "views": 100, "published": 0,
                        "published_at": null, "author_id": null, "category_id": null }),
                json!({ "id": 4, "title": "Doe", "body": "x", "views": 30, "published": 1,
                        "published_at": null, "author_id": 5, "category_id": null }),
            ],
        )
        .with_table(
            "persons",
            &["id", "name", "email"],
            vec![
                json!({ "id": 5, "name": "Ann", "email": "ann@example.com" }),
                json!({ "id": 6, "name": "John Doe", "email": "" }),
                json!({ "id": 7, "name": "Doe", "email": null }),
            ],
        )
        .with_table(
            "comments",
            &["id", "body", "article_id"],
            vec![
                json!({ "id": 1, "body": "nice", "article_id": 1 }),
                json!({ "id": 2, "body": "great", "article_id": 1 }),
                json!({ "id": 3, "body": "meh", "article_id": 2 }),
            ],
        )
        .with_table("blog_categories", &["id", "label"], vec![json!({ "id": 1, "label": "rust" })])
}

pub fn state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(store());
    let state = AppState::new(registry(), store.clone() as Arc<dyn Store>, "/forest");
    (state, store)
}
