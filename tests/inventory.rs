mod common;

use rental_inventory::model::{
    AvailabilityUpdate, ItemCreate, ItemUpdate, PartCreate, PartUpdate, PartVariantUpdate, RentableCreate, RentableUpdate,
};
use rental_inventory::service::{AvailabilityService, ItemService, PartService, RentableService, VariantService};
use rental_inventory::{AppError, Validate};
use serde_json::json;

fn rentable(body: serde_json::Value) -> RentableCreate {
    serde_json::from_value::<RentableCreate>(body).unwrap().validate().unwrap()
}

fn part_update(body: serde_json::Value) -> PartUpdate {
    serde_json::from_value::<PartUpdate>(body).unwrap().validate().unwrap()
}

fn counters(a: &rental_inventory::model::Availability) -> (i32, i32, i32) {
    (a.total, a.maintenance, a.broken)
}

fn availability_update(body: serde_json::Value) -> AvailabilityUpdate {
    serde_json::from_value::<AvailabilityUpdate>(body).unwrap().validate().unwrap()
}

#[tokio::test]
async fn tent_with_pole_round_trip_and_availability_patch() {
    let Some(pool) = common::pool().await else { return };
    let name = common::unique_name("tent");
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": name,
            "description": "A tent",
            "has_parts": true,
            "availability": null,
            "parts": [{"name": "Pole", "description": null, "quantity": 4, "availability": null}]
        })),
    )
    .await
    .unwrap();

    assert!(created.has_parts);
    assert_eq!(created.availability.total, 0);
    let parts = created.parts.as_ref().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "Pole");
    assert_eq!(parts[0].quantity, 4);
    assert_eq!(parts[0].rentable_id, created.id);
    let pole_availability = parts[0].availability.as_ref().unwrap();
    assert_eq!((pole_availability.total, pole_availability.maintenance, pole_availability.broken), (0, 0, 0));

    let aid = created.availability.id;
    let a = AvailabilityService::update(&pool, aid, availability_update(json!({"total": 10}))).await.unwrap();
    assert_eq!((a.total, a.maintenance, a.broken), (10, 0, 0));

    // null leaves the counter alone
    let a = AvailabilityService::update(&pool, aid, availability_update(json!({"maintenance": 5, "total": null})))
        .await
        .unwrap();
    assert_eq!((a.total, a.maintenance, a.broken), (10, 5, 0));

    let err = AvailabilityService::update(&pool, aid, availability_update(json!({"broken": 6}))).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let a = AvailabilityService::read(&pool, aid).await.unwrap();
    assert_eq!((a.total, a.maintenance, a.broken), (10, 5, 0));

    let err = AvailabilityService::update(&pool, aid, availability_update(json!({"total": null}))).await.unwrap_err();
    assert!(matches!(err, AppError::NoValidFields(_)));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn supplied_counters_are_stored() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("kayak"),
            "has_parts": false,
            "availability": {"total": 7, "broken": 2}
        })),
    )
    .await
    .unwrap();
    assert_eq!((created.availability.total, created.availability.maintenance, created.availability.broken), (7, 0, 2));
    assert!(created.parts.is_none());
    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn failed_part_insert_leaves_no_rentable() {
    let Some(pool) = common::pool().await else { return };
    let name = common::unique_name("rollback");
    // NUL passes the length rules but PostgreSQL refuses it in text columns.
    let body = rentable(json!({
        "name": name,
        "has_parts": true,
        "parts": [
            {"name": "Fine", "quantity": 1},
            {"name": "Bad\u{0}", "quantity": 1}
        ]
    }));
    let err = RentableService::create(&pool, body).await.unwrap_err();
    assert!(matches!(err, AppError::Db(_)));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rentable WHERE name = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn deleting_last_part_clears_has_parts() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("bike"),
            "has_parts": true,
            "parts": [{"name": "Wheel", "quantity": 2}, {"name": "Seat", "quantity": 1}]
        })),
    )
    .await
    .unwrap();
    let parts = created.parts.unwrap();
    let wheel_availability = parts.iter().find(|p| p.name == "Wheel").unwrap().availability.clone().unwrap();

    PartService::delete(&pool, parts[0].id).await.unwrap();
    let after_one = RentableService::read(&pool, created.id).await.unwrap();
    assert!(after_one.has_parts);
    assert_eq!(after_one.parts.unwrap().len(), 1);

    PartService::delete(&pool, parts[1].id).await.unwrap();
    let after_all = RentableService::read(&pool, created.id).await.unwrap();
    assert!(!after_all.has_parts);
    assert!(after_all.parts.is_none());

    let err = AvailabilityService::read(&pool, wheel_availability.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = PartService::delete(&pool, parts[0].id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn standalone_part_create_marks_rentable() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(&pool, rentable(json!({"name": common::unique_name("canoe"), "has_parts": false})))
        .await
        .unwrap();
    let part: PartCreate = serde_json::from_value(json!({
        "name": "Paddle",
        "quantity": 2,
        "rentable_id": created.id,
        "availability": {"total": 2}
    }))
    .unwrap();
    let part = PartService::create(&pool, part.validate().unwrap()).await.unwrap();
    assert_eq!(part.availability.as_ref().map(|a| a.total), Some(2));

    let read = RentableService::read(&pool, created.id).await.unwrap();
    assert!(read.has_parts);
    assert_eq!(read.parts.unwrap()[0].id, part.id);

    let orphan: PartCreate = serde_json::from_value(json!({
        "name": "Paddle",
        "quantity": 2,
        "rentable_id": uuid::Uuid::new_v4()
    }))
    .unwrap();
    let err = PartService::create(&pool, orphan).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn interchangeable_flip_migrates_stock() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("board"),
            "has_parts": true,
            "parts": [{
                "name": "Fin",
                "quantity": 1,
                "interchangeable": true,
                "variants": [
                    {"name": "Small", "availability": {"total": 3}},
                    {"name": "Large", "description": "For big waves"}
                ]
            }]
        })),
    )
    .await
    .unwrap();
    let fin = &created.parts.as_ref().unwrap()[0];
    assert!(fin.interchangeable);
    assert!(fin.availability.is_none());
    let variants = fin.variants.as_ref().unwrap();
    assert_eq!(variants.len(), 2);
    let small = variants.iter().find(|v| v.name == "Small").unwrap();
    assert_eq!(small.availability.total, 3);

    let listed = VariantService::list(&pool).await.unwrap();
    assert!(listed.iter().any(|v| v.id == small.id));

    let to_fixed: PartUpdate =
        serde_json::from_value(json!({"interchangeable": false, "availability": {"total": 5, "maintenance": 1}})).unwrap();
    let fixed = PartService::update(&pool, fin.id, to_fixed.validate().unwrap()).await.unwrap();
    assert!(!fixed.interchangeable);
    assert!(fixed.variants.is_none());
    let a = fixed.availability.unwrap();
    assert_eq!((a.total, a.maintenance), (5, 1));
    let err = VariantService::read(&pool, small.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let bad: PartUpdate = serde_json::from_value(json!({"variants": [{"name": "Tiny"}]})).unwrap();
    let err = PartService::update(&pool, fin.id, bad.validate().unwrap()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let back: PartUpdate =
        serde_json::from_value(json!({"interchangeable": true, "variants": [{"name": "Medium"}], "name": "  Fin v2 "}))
            .unwrap();
    let flipped = PartService::update(&pool, fin.id, back.validate().unwrap()).await.unwrap();
    assert_eq!(flipped.name, "Fin v2");
    assert!(flipped.availability.is_none());
    assert_eq!(flipped.variants.unwrap()[0].name, "Medium");
    let err = AvailabilityService::read(&pool, a.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn rentable_update_appends_parts_and_guards_has_parts() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(&pool, rentable(json!({"name": common::unique_name("sup"), "has_parts": false})))
        .await
        .unwrap();

    let add: RentableUpdate =
        serde_json::from_value(json!({"parts": [{"name": "Leash", "quantity": 1}], "description": "Stand-up paddle"}))
            .unwrap();
    let updated = RentableService::update(&pool, created.id, add.validate().unwrap()).await.unwrap();
    assert!(updated.has_parts);
    assert_eq!(updated.description.as_deref(), Some("Stand-up paddle"));
    assert_eq!(updated.parts.as_ref().unwrap().len(), 1);

    let clear: RentableUpdate = serde_json::from_value(json!({"has_parts": false})).unwrap();
    let err = RentableService::update(&pool, created.id, clear.validate().unwrap()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let drop_description: RentableUpdate = serde_json::from_value(json!({"description": null})).unwrap();
    let updated = RentableService::update(&pool, created.id, drop_description.validate().unwrap()).await.unwrap();
    assert!(updated.description.is_none());

    RentableService::delete(&pool, created.id).await.unwrap();
    let err = RentableService::read(&pool, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = AvailabilityService::read(&pool, created.availability.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn has_parts_false_with_parts_stores_no_parts() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("tarp"),
            "has_parts": false,
            "parts": [{"name": "Rope", "quantity": 4}]
        })),
    )
    .await
    .unwrap();
    assert!(!created.has_parts);
    assert!(created.parts.is_none());
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM part WHERE rentable_id = $1")
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn fixed_part_patch_keeps_unsent_counters() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("raft"),
            "has_parts": true,
            "parts": [{"name": "Oar", "quantity": 2, "availability": {"total": 10, "maintenance": 3, "broken": 1}}]
        })),
    )
    .await
    .unwrap();
    let oar = &created.parts.as_ref().unwrap()[0];
    let before = oar.availability.clone().unwrap();
    assert_eq!(counters(&before), (10, 3, 1));

    let part = PartService::update(&pool, oar.id, part_update(json!({"availability": {"total": 20}})))
        .await
        .unwrap();
    let after = part.availability.unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(counters(&after), (20, 3, 1));

    let part = PartService::update(&pool, oar.id, part_update(json!({"availability": {"maintenance": 2, "broken": null}})))
        .await
        .unwrap();
    assert_eq!(counters(&part.availability.unwrap()), (20, 2, 1));

    let err = PartService::update(&pool, oar.id, part_update(json!({"availability": {"broken": 19}})))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(v) => assert!(v.has_path("availability")),
        other => panic!("expected validation error, got {:?}", other),
    }
    let stored = AvailabilityService::read(&pool, before.id).await.unwrap();
    assert_eq!(counters(&stored), (20, 2, 1));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn turning_fixed_merges_counters_onto_zero() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("glider"),
            "has_parts": true,
            "parts": [{
                "name": "Harness",
                "quantity": 1,
                "interchangeable": true,
                "variants": [{"name": "Small", "availability": {"total": 3}}]
            }]
        })),
    )
    .await
    .unwrap();
    let harness = &created.parts.as_ref().unwrap()[0];

    // (0, 2, 0) after the merge: rejected and rolled back.
    let err = PartService::update(
        &pool,
        harness.id,
        part_update(json!({"interchangeable": false, "availability": {"maintenance": 2}})),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let unchanged = PartService::read(&pool, harness.id).await.unwrap();
    assert!(unchanged.interchangeable);
    assert_eq!(unchanged.variants.unwrap().len(), 1);

    let fixed = PartService::update(
        &pool,
        harness.id,
        part_update(json!({"interchangeable": false, "availability": {"total": 4}})),
    )
    .await
    .unwrap();
    assert!(!fixed.interchangeable);
    assert_eq!(counters(&fixed.availability.unwrap()), (4, 0, 0));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn variant_patch_renames_and_clears_description() {
    let Some(pool) = common::pool().await else { return };
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": common::unique_name("surfboard"),
            "has_parts": true,
            "parts": [{
                "name": "Fin",
                "quantity": 1,
                "interchangeable": true,
                "variants": [{"name": "Large", "description": "For big waves", "availability": {"total": 2}}]
            }]
        })),
    )
    .await
    .unwrap();
    let large = created.parts.as_ref().unwrap()[0].variants.as_ref().unwrap()[0].clone();

    let update: PartVariantUpdate = serde_json::from_value(json!({"name": "  Huge ", "description": null})).unwrap();
    let updated = VariantService::update(&pool, large.id, update.validate().unwrap()).await.unwrap();
    assert_eq!(updated.id, large.id);
    assert_eq!(updated.name, "Huge");
    assert!(updated.description.is_none());
    assert_eq!(updated.availability, large.availability);

    let update: PartVariantUpdate = serde_json::from_value(json!({"name": "Gone"})).unwrap();
    let err = VariantService::update(&pool, uuid::Uuid::new_v4(), update).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn create_stores_trimmed_names() {
    let Some(pool) = common::pool().await else { return };
    let name = common::unique_name("sled");
    let created = RentableService::create(
        &pool,
        rentable(json!({
            "name": format!("  {}  ", name),
            "description": " Wooden ",
            "has_parts": true,
            "parts": [{"name": " Runner ", "quantity": 2}]
        })),
    )
    .await
    .unwrap();
    assert_eq!(created.name, name);
    assert_eq!(created.description.as_deref(), Some("Wooden"));
    assert_eq!(created.parts.unwrap()[0].name, "Runner");
    RentableService::delete(&pool, created.id).await.unwrap();
}

#[tokio::test]
async fn item_create_read_update_delete() {
    let Some(pool) = common::pool().await else { return };
    let name = common::unique_name("lamp");
    let create: ItemCreate = serde_json::from_value(json!({"name": name, "description": "Camping lamp"})).unwrap();
    let item = ItemService::create(&pool, create.validate().unwrap()).await.unwrap();
    assert_eq!(item.name, name);
    assert_eq!(counters(&item.availability), (0, 0, 0));

    let listed = ItemService::list(&pool).await.unwrap();
    assert!(listed.iter().any(|i| i.id == item.id));

    AvailabilityService::update(&pool, item.availability.id, availability_update(json!({"total": 6})))
        .await
        .unwrap();
    let update: ItemUpdate = serde_json::from_value(json!({"name": "Lantern", "description": null})).unwrap();
    let updated = ItemService::update(&pool, item.id, update.validate().unwrap()).await.unwrap();
    assert_eq!(updated.name, "Lantern");
    assert!(updated.description.is_none());
    assert_eq!(updated.availability.total, 6);

    ItemService::delete(&pool, item.id).await.unwrap();
    let err = ItemService::read(&pool, item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = AvailabilityService::read(&pool, item.availability.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = ItemService::delete(&pool, item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
