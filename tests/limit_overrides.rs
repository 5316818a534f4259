mod common;

use common::{add_to_cart, auth, create_asset, create_partner, create_user, database_url, setup_state};
use partner_portal::{
    dto::partners::{AssignCategoryRequest, SetAssetLimitRequest},
    error::AppError,
    services::partner_service,
};

// Limits stored in the partner and partner-category tables drive cart checks.
#[tokio::test]
async fn partner_and_category_overrides_apply_to_cart() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url).await?;
    let admin = auth(create_user(&state, "limitadmin", "superadmin").await?, "superadmin");

    let first_user = create_user(&state, "limitfirst", "partner").await?;
    let first_partner_id = create_partner(&state, first_user).await?;
    let second_user = create_user(&state, "limitsecond", "partner").await?;
    let second_partner_id = create_partner(&state, second_user).await?;

    // asset default of 2
    let router = create_asset(&state, "Router", "ROU-0001", 1500, false, Some(2)).await?;

    let gold = partner_service::list_partner_categories(&state, &admin)
        .await?
        .data
        .unwrap()
        .into_iter()
        .find(|category| category.code == "gold")
        .ok_or_else(|| anyhow::anyhow!("gold partner category is not seeded"))?;

    partner_service::set_category_limit(
        &state,
        &admin,
        gold.id,
        SetAssetLimitRequest {
            asset_id: router.id,
            max_purchase_limit: 4,
        },
    )
    .await?;
    for partner_id in [first_partner_id, second_partner_id] {
        partner_service::assign_category(
            &state,
            &admin,
            partner_id,
            AssignCategoryRequest {
                category_id: Some(gold.id),
            },
        )
        .await?;
    }

    // First partner: own override of 5 shadows the category limit
    partner_service::set_partner_limit(
        &state,
        &admin,
        first_partner_id,
        SetAssetLimitRequest {
            asset_id: router.id,
            max_purchase_limit: 5,
        },
    )
    .await?;
    let first = auth(first_user, "partner");
    assert_eq!(add_to_cart(&state, &first, router.id, 5).await?, 5);
    let over = add_to_cart(&state, &first, router.id, 1).await;
    assert!(matches!(over, Err(AppError::LimitExceeded { remaining: 0 })));

    // Second partner: a zero override is unset, so the category limit of 4 applies
    partner_service::set_partner_limit(
        &state,
        &admin,
        second_partner_id,
        SetAssetLimitRequest {
            asset_id: router.id,
            max_purchase_limit: 0,
        },
    )
    .await?;
    let second = auth(second_user, "partner");
    assert_eq!(add_to_cart(&state, &second, router.id, 3).await?, 3);
    let over = add_to_cart(&state, &second, router.id, 2).await;
    assert!(matches!(over, Err(AppError::LimitExceeded { remaining: 1 })));

    Ok(())
}
