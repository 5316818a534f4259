use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    entity::{
        partner_categories::{Column as PartnerCategoryCol, Entity as PartnerCategories},
        partners::{ActiveModel as PartnerActive, Column as PartnerCol, Entity as Partners},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    import::ImportReport,
    models::UserType,
    services::auth_service::hash_password,
};

#[derive(Debug, Deserialize)]
pub struct PartnerRow {
    #[serde(rename = "FIRM NAME")]
    pub firm_name: String,
    #[serde(rename = "SD AMOUNT")]
    pub sd_amount: String,
    #[serde(rename = "PARTNER NAME")]
    pub partner_name: String,
    #[serde(rename = "INVENTORY SHIPPING ADDRESS", default)]
    pub address: String,
    #[serde(rename = "MOBILE", default)]
    pub mobile: String,
}

/// A validated partner row.
#[derive(Debug, PartialEq, Eq)]
pub struct PartnerRecord {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: Option<String>,
    /// Security deposit in rupees.
    pub deposit: i64,
}

impl PartnerRecord {
    pub fn from_row(row: PartnerRow) -> anyhow::Result<Self> {
        let username = username_for(&row.firm_name);
        if username.is_empty() {
            anyhow::bail!("firm name is empty");
        }
        let deposit = row
            .sd_amount
            .replace(',', "")
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("invalid SD AMOUNT `{}`", row.sd_amount))?;
        let (first_name, last_name) = split_name(&row.partner_name);

        Ok(Self {
            username,
            first_name,
            last_name,
            address: row.address,
            phone: Some(row.mobile).filter(|m| !m.is_empty()),
            deposit,
        })
    }

    pub fn category_code(&self) -> &'static str {
        category_code_for(self.deposit)
    }
}

/// Login name derived from the firm: spaces removed, lowercased.
pub fn username_for(firm_name: &str) -> String {
    firm_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Partner category by security deposit in rupees.
pub fn category_code_for(deposit: i64) -> &'static str {
    match deposit {
        d if d >= 50_000 => "platinum",
        d if d >= 25_000 => "gold",
        _ => "silver",
    }
}

fn split_name(full: &str) -> (String, String) {
    match full.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.trim().to_string(), String::new()),
    }
}

pub async fn import_partners(
    orm: &DatabaseConnection,
    rows: Vec<PartnerRow>,
    default_password: &str,
) -> anyhow::Result<ImportReport> {
    let password_hash =
        hash_password(default_password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let firm = row.firm_name.clone();
        let record = match PartnerRecord::from_row(row) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(row = index + 1, firm = %firm, error = %err, "skipping partner row");
                report.skipped += 1;
                continue;
            }
        };

        match upsert_partner(orm, &record, &password_hash).await {
            Ok(true) => report.created += 1,
            Ok(false) => report.updated += 1,
            Err(err) => {
                tracing::warn!(row = index + 1, username = %record.username, error = %err, "partner import failed");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Returns `true` when a new partner was created.
async fn upsert_partner(
    orm: &DatabaseConnection,
    record: &PartnerRecord,
    password_hash: &str,
) -> anyhow::Result<bool> {
    let txn = orm.begin().await?;

    let category_id = PartnerCategories::find()
        .filter(PartnerCategoryCol::Code.eq(record.category_code()))
        .one(&txn)
        .await?
        .map(|category| category.id);

    let user = match Users::find()
        .filter(UserCol::Username.eq(record.username.as_str()))
        .one(&txn)
        .await?
    {
        Some(user) => user,
        None => {
            tracing::info!(username = %record.username, "user created");
            UserActive {
                id: Set(Uuid::new_v4()),
                username: Set(record.username.clone()),
                email: Set(format!("{}@example.com", record.username)),
                password_hash: Set(password_hash.to_string()),
                user_type: Set(UserType::Partner.as_str().to_string()),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    // wallet is held in paise
    let wallet = record.deposit * 100;

    let existing = Partners::find()
        .filter(PartnerCol::UserId.eq(user.id))
        .one(&txn)
        .await?;
    let created = match existing {
        Some(partner) => {
            let mut active: PartnerActive = partner.into();
            active.first_name = Set(record.first_name.clone());
            active.last_name = Set(record.last_name.clone());
            active.address = Set(Some(record.address.clone()));
            if record.phone.is_some() {
                active.phone = Set(record.phone.clone());
            }
            active.category_id = Set(category_id);
            active.refundable_wallet = Set(wallet);
            active.update(&txn).await?;
            false
        }
        None => {
            let count = Partners::find().count(&txn).await?;
            PartnerActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.id),
                category_id: Set(category_id),
                first_name: Set(record.first_name.clone()),
                last_name: Set(record.last_name.clone()),
                phone: Set(record.phone.clone()),
                address: Set(Some(record.address.clone())),
                code: Set(Some(format!("P{}", 1000 + count))),
                refundable_wallet: Set(wallet),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            true
        }
    };

    txn.commit().await?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(firm: &str, amount: &str, name: &str) -> PartnerRow {
        PartnerRow {
            firm_name: firm.into(),
            sd_amount: amount.into(),
            partner_name: name.into(),
            address: "12 Market St".into(),
            mobile: String::new(),
        }
    }

    #[test]
    fn deposit_selects_category() {
        assert_eq!(category_code_for(50_000), "platinum");
        assert_eq!(category_code_for(75_000), "platinum");
        assert_eq!(category_code_for(49_999), "gold");
        assert_eq!(category_code_for(25_000), "gold");
        assert_eq!(category_code_for(24_999), "silver");
        assert_eq!(category_code_for(0), "silver");
    }

    #[test]
    fn username_strips_spaces_and_lowercases() {
        assert_eq!(username_for("Star Net Communications"), "starnetcommunications");
        assert_eq!(username_for(" ABC  Cable "), "abccable");
    }

    #[test]
    fn record_splits_partner_name() {
        let record = PartnerRecord::from_row(row("Star Net", "30,000", "Ravi Kumar Singh")).unwrap();
        assert_eq!(record.first_name, "Ravi");
        assert_eq!(record.last_name, "Kumar Singh");
        assert_eq!(record.deposit, 30_000);
        assert_eq!(record.category_code(), "gold");
        assert_eq!(record.phone, None);

        let record = PartnerRecord::from_row(row("Star Net", "100", "Ravi")).unwrap();
        assert_eq!(record.last_name, "");
    }

    #[test]
    fn invalid_rows_are_rejected() {
        assert!(PartnerRecord::from_row(row("Star Net", "lots", "Ravi")).is_err());
        assert!(PartnerRecord::from_row(row("   ", "100", "Ravi")).is_err());
    }
}
