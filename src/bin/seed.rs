use partner_portal::{
    db::{create_orm_conn, run_migrations},
    entity::{
        asset_categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as AssetCategories},
        assets::{ActiveModel as AssetActive, Column as AssetCol, Entity as Assets},
        partner_categories::{Column as PartnerCategoryCol, Entity as PartnerCategories},
        partners::{ActiveModel as PartnerActive, Column as PartnerCol, Entity as Partners},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    models::UserType,
    services::auth_service::hash_password,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin", "admin12345", UserType::Superadmin).await?;
    ensure_user(&orm, "store", "store12345", UserType::Store).await?;
    let partner_user_id = ensure_user(&orm, "demopartner", "partner12345", UserType::Partner).await?;
    ensure_partner(&orm, partner_user_id).await?;
    seed_assets(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, Partner user ID: {partner_user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    username: &str,
    password: &str,
    user_type: UserType,
) -> anyhow::Result<Uuid> {
    if let Some(user) = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(orm)
        .await?
    {
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set(password_hash),
        user_type: Set(user_type.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Ensured user {username} ({})", user_type.as_str());
    Ok(user.id)
}

async fn ensure_partner(orm: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<()> {
    let exists = Partners::find()
        .filter(PartnerCol::UserId.eq(user_id))
        .one(orm)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    let category_id = PartnerCategories::find()
        .filter(PartnerCategoryCol::Code.eq("gold"))
        .one(orm)
        .await?
        .map(|category| category.id);

    PartnerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        category_id: Set(category_id),
        first_name: Set("Demo".into()),
        last_name: Set("Partner".into()),
        phone: Set(Some("9000000000".into())),
        address: Set(Some("12 Market Road".into())),
        code: Set(Some("P1000".into())),
        refundable_wallet: Set(0),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;
    println!("Seeded partner profile");
    Ok(())
}

async fn seed_assets(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let category_id = match AssetCategories::find()
        .filter(CategoryCol::Code.eq("CPE"))
        .one(orm)
        .await?
    {
        Some(category) => category.id,
        None => {
            CategoryActive {
                id: Set(Uuid::new_v4()),
                name: Set("Customer premises equipment".into()),
                code: Set("CPE".into()),
                description: Set(None),
            }
            .insert(orm)
            .await?
            .id
        }
    };

    // name, code, price in paise, refundable deposit, per-partner limit
    let assets = [
        ("ONT Router", "ONT-0001", 180_000, false, Some(10)),
        ("Set Top Box", "STB-0001", 120_000, false, Some(20)),
        ("Security Deposit Kit", "SDK-0001", 500_000, true, Some(1)),
        ("Patch Cord", "PC-0001", 5_000, false, None),
    ];

    for (name, code, price, refundable, limit) in assets {
        let exists = Assets::find()
            .filter(AssetCol::AssetCode.eq(code))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        AssetActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category_id: Set(Some(category_id)),
            description: Set(None),
            asset_code: Set(code.to_string()),
            location: Set(None),
            quantity: Set(100),
            purchase_price: Set(price),
            is_refundable_wallet_deposit: Set(refundable),
            max_order_per_partner: Set(limit),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded assets");
    Ok(())
}
