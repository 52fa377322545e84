use crate::id_type::EntityId;
use crate::query_builder::builder::COUNT_FIELD;
use crate::query_builder::pagination::total_pages;
use crate::query_builder::{
    selection_pipeline, PageRequest, Pagination, PipelineBuilder, QueryFilter, TextSearch,
};
use mongodb::bson::{doc, Bson, Document};
use serde_json::json;
use type_mapping::TypedStruct;

fn filters(value: serde_json::Value) -> TypedStruct {
    TypedStruct::try_from(value).unwrap()
}

// ========================================
// Filter and search
// ========================================

#[test]
fn test_filter_and_search_share_one_match() {
    let search = TextSearch::new("jo", &["name", "email"]).unwrap();
    let filter = QueryFilter::new()
        .with_filters(filters(json!({"status": "active"})))
        .with_search(search);

    let plan = PipelineBuilder::new().filter(filter).build();

    let expected = doc! {
        "$match": {
            "$or": [
                { "name": { "$regex": "jo", "$options": "i" } },
                { "email": { "$regex": "jo", "$options": "i" } },
            ],
            "status": "active",
        }
    };
    assert_eq!(plan.data[0], expected);
    assert_eq!(plan.count[0], expected);
}

#[test]
fn test_search_needs_text_and_fields() {
    assert!(TextSearch::new("", &["name"]).unwrap().is_none());
    assert!(TextSearch::new("jo", &[] as &[&str]).unwrap().is_none());
    assert!(TextSearch::new("jo", &["$where"]).is_err());
}

#[test]
fn test_caller_or_replaces_search_clause() {
    let search = TextSearch::new("jo", &["name"]).unwrap();
    let filter = QueryFilter::new()
        .with_filters(filters(json!({"$or": [{"role": "admin"}]})))
        .with_search(search);

    let conditions = filter.to_match_document();
    assert_eq!(conditions.len(), 1);
    assert_eq!(
        conditions.get_array("$or").unwrap(),
        &vec![Bson::Document(doc! { "role": "admin" })]
    );
}

#[test]
fn test_empty_filter_adds_no_match() {
    let plan = PipelineBuilder::new().build();
    assert_eq!(plan.count, vec![doc! { "$count": COUNT_FIELD }]);
    assert!(plan.data.iter().all(|stage| !stage.contains_key("$match")));
}

// ========================================
// Pipeline shape
// ========================================

#[test]
fn test_data_pipeline_order() {
    let caller_stage = doc! { "$sort": { "name": 1 } };
    let plan = PipelineBuilder::new()
        .filter(QueryFilter::new().with_filters(filters(json!({"age": 30}))))
        .stages(vec![caller_stage.clone()])
        .fields(&["name", "email"])
        .unwrap()
        .page(PageRequest::new(3, 20))
        .build();

    let keys: Vec<&str> = plan
        .data
        .iter()
        .map(|stage| stage.keys().next().map(String::as_str).unwrap_or(""))
        .collect();
    assert_eq!(keys, vec!["$match", "$sort", "$skip", "$limit", "$project"]);

    assert_eq!(plan.data[1], caller_stage);
    assert_eq!(plan.data[2], doc! { "$skip": 40_i64 });
    assert_eq!(plan.data[3], doc! { "$limit": 20_i64 });
    assert_eq!(
        plan.data[4],
        doc! { "$project": { "name": 1, "email": 1 } }
    );
}

#[test]
fn test_caller_stages_stay_out_of_count() {
    let plan = PipelineBuilder::new()
        .stages(vec![doc! { "$match": { "x": 1 } }, doc! { "$limit": 3 }])
        .build();

    assert_eq!(plan.count.len(), 1);
    assert_eq!(plan.count.last(), Some(&doc! { "$count": "total" }));
}

#[test]
fn test_invalid_projection_field() {
    assert!(PipelineBuilder::new().fields(&["ok", "$bad"]).is_err());
}

// ========================================
// Pagination
// ========================================

#[test]
fn test_page_request_clamping() {
    assert_eq!(PageRequest::new(0, 0).page_size(), 10);
    assert_eq!(PageRequest::new(1, 5000).page_size(), 1000);
    assert_eq!(PageRequest::new(1, -1).page_size(), 10);
    assert_eq!(PageRequest::new(-2, 10).page(), 1);
    assert_eq!(PageRequest::new(1, 10).skip(), 0);
    assert_eq!(PageRequest::new(4, 25).skip(), 75);
}

#[test]
fn test_total_pages() {
    assert_eq!(total_pages(0, 10), 0);
    assert_eq!(total_pages(95, 10), 10);
    assert_eq!(total_pages(100, 10), 10);
    assert_eq!(total_pages(101, 10), 11);
    assert_eq!(total_pages(5, 0), 0);
}

#[test]
fn test_pagination_serializes_camel_case() {
    let pagination = Pagination::new(PageRequest::new(2, 10), 95);
    let value = serde_json::to_value(pagination).unwrap();
    assert_eq!(
        value,
        json!({"currentPage": 2, "pageSize": 10, "totalPages": 10, "totalItems": 95})
    );
}

// ========================================
// Selection
// ========================================

#[test]
fn test_selection_with_ids_and_stages() {
    let id = EntityId::parse("65a1b2c3d4e5f60718293a4b").unwrap();
    let stages = vec![doc! { "$match": { "status": "archived" } }];

    let pipeline = selection_pipeline(stages.clone(), &[id]);
    assert_eq!(pipeline.len(), 3);
    assert_eq!(pipeline[0], stages[0]);
    assert_eq!(
        pipeline[1],
        doc! { "$match": { "_id": { "$in": [id.object_id()] } } }
    );
    assert_eq!(pipeline[2], doc! { "$project": { "_id": 1 } });
}

#[test]
fn test_selection_without_ids() {
    let pipeline = selection_pipeline(vec![doc! { "$match": { "a": 1 } }], &[]);
    let last: &Document = pipeline.last().unwrap();
    assert_eq!(pipeline.len(), 2);
    assert_eq!(last, &doc! { "$project": { "_id": 1 } });
}
