use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    entity::{
        assets::{ActiveModel as AssetActive, Column as AssetCol, Entity as Assets},
        order_item_serials::{ActiveModel as SerialActive, Column as SerialCol, Entity as OrderItemSerials},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        partners::{Column as PartnerCol, Entity as Partners},
        users::{Column as UserCol, Entity as Users},
    },
    import::{ImportReport, partners::username_for},
    models::OrderStatus,
    services::order_service::allocate_dc_number,
};

#[derive(Debug, Deserialize)]
pub struct OrderRow {
    #[serde(rename = "Partner", default)]
    pub partner: String,
    #[serde(rename = "Asset", default)]
    pub asset: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Dispatched Date", default)]
    pub dispatched_date: String,
    #[serde(rename = "Serial Number", default)]
    pub serial_number: String,
    #[serde(rename = "MAC Number", default)]
    pub mac_number: String,
}

impl OrderRow {
    /// Serial number, falling back to the MAC number.
    pub fn serial(&self) -> Option<&str> {
        [self.serial_number.as_str(), self.mac_number.as_str()]
            .into_iter()
            .find(|value| !value.is_empty())
    }

    pub fn mac(&self) -> Option<String> {
        Some(self.mac_number.clone()).filter(|mac| !mac.is_empty())
    }
}

/// Dispatch dates are written `dd.mm.yyyy`.
pub fn parse_dispatch_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%d.%m.%Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn legacy_order_number(serial: &str) -> String {
    format!("OLD-{serial}")
}

/// Code for an asset first seen in an import, e.g. `ROU-0007`.
pub fn asset_code_for(name: &str, existing_assets: u64) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{:04}", prefix, existing_assets + 1)
}

#[derive(Debug, PartialEq, Eq)]
enum RowOutcome {
    Created,
    Existing,
}

pub async fn import_orders(
    orm: &DatabaseConnection,
    rows: Vec<OrderRow>,
) -> anyhow::Result<ImportReport> {
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        match import_row(orm, &row).await {
            Ok(RowOutcome::Created) => report.created += 1,
            Ok(RowOutcome::Existing) => report.updated += 1,
            Err(err) => {
                tracing::warn!(row = index + 1, partner = %row.partner, error = %err, "skipping order row");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

async fn import_row(orm: &DatabaseConnection, row: &OrderRow) -> anyhow::Result<RowOutcome> {
    if row.partner.is_empty() {
        anyhow::bail!("partner name missing");
    }
    if row.asset.is_empty() {
        anyhow::bail!("asset name missing");
    }
    let serial = row
        .serial()
        .ok_or_else(|| anyhow::anyhow!("no serial or MAC number"))?
        .to_string();

    let txn = orm.begin().await?;

    let username = username_for(&row.partner);
    let user = Users::find()
        .filter(UserCol::Username.eq(username.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {username} not found"))?;
    Partners::find()
        .filter(PartnerCol::UserId.eq(user.id))
        .one(&txn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("partner for user {username} not found"))?;

    let asset = match Assets::find()
        .filter(AssetCol::Name.eq(row.asset.as_str()))
        .one(&txn)
        .await?
    {
        Some(asset) if asset.location.is_none() && !row.location.is_empty() => {
            let mut active: AssetActive = asset.into();
            active.location = Set(Some(row.location.clone()));
            active.update(&txn).await?
        }
        Some(asset) => asset,
        None => {
            let count = Assets::find().count(&txn).await?;
            let asset = AssetActive {
                id: Set(Uuid::new_v4()),
                name: Set(row.asset.clone()),
                category_id: Set(None),
                description: Set(None),
                asset_code: Set(asset_code_for(&row.asset, count)),
                location: Set(Some(row.location.clone()).filter(|l| !l.is_empty())),
                quantity: Set(1),
                purchase_price: Set(0),
                is_refundable_wallet_deposit: Set(false),
                max_order_per_partner: Set(None),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            tracing::info!(asset = %asset.name, code = %asset.asset_code, "asset created");
            asset
        }
    };

    let order_number = legacy_order_number(&serial);
    let (order, mut outcome) = match Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number.as_str()))
        .one(&txn)
        .await?
    {
        Some(order) => (order, RowOutcome::Existing),
        None => {
            let dispatched = parse_dispatch_date(&row.dispatched_date).unwrap_or_else(|| {
                tracing::warn!(date = %row.dispatched_date, "invalid dispatch date, using now");
                Utc::now()
            });
            let dc_number = allocate_dc_number(&txn).await?;
            let order = OrderActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.id),
                order_number: Set(order_number),
                amount: Set(0),
                status: Set(OrderStatus::Completed.as_str().to_string()),
                gateway_order_id: Set(None),
                gateway_payment_id: Set(None),
                gateway_signature: Set(None),
                dc_number: Set(Some(dc_number)),
                paid_at: Set(None),
                created_at: Set(dispatched.into()),
                updated_at: Set(dispatched.into()),
            }
            .insert(&txn)
            .await?;
            (order, RowOutcome::Created)
        }
    };

    let item = match OrderItems::find()
        .filter(
            Condition::all()
                .add(OrderItemCol::OrderId.eq(order.id))
                .add(OrderItemCol::AssetId.eq(asset.id)),
        )
        .one(&txn)
        .await?
    {
        Some(item) => item,
        None => {
            outcome = RowOutcome::Created;
            OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                asset_id: Set(asset.id),
                quantity: Set(1),
                price: Set(0),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    let serial_exists = OrderItemSerials::find()
        .filter(SerialCol::SerialNumber.eq(serial.as_str()))
        .one(&txn)
        .await?
        .is_some();
    if !serial_exists {
        outcome = RowOutcome::Created;
        SerialActive {
            id: Set(Uuid::new_v4()),
            order_item_id: Set(item.id),
            serial_number: Set(serial),
            make: Set(Some(asset.name.clone())),
            model: Set(row.mac()),
            mac_id: Set(row.mac()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    fn row(serial: &str, mac: &str) -> OrderRow {
        OrderRow {
            partner: "Star Net".into(),
            asset: "Router".into(),
            location: String::new(),
            dispatched_date: "05.03.2024".into(),
            serial_number: serial.into(),
            mac_number: mac.into(),
        }
    }

    #[test]
    fn serial_falls_back_to_mac() {
        assert_eq!(row("SN1", "AA:BB").serial(), Some("SN1"));
        assert_eq!(row("", "AA:BB").serial(), Some("AA:BB"));
        assert_eq!(row("", "").serial(), None);
    }

    #[test]
    fn dispatch_date_is_day_first() {
        let date = parse_dispatch_date("05.03.2024").unwrap();
        assert_eq!((date.day(), date.month(), date.year()), (5, 3, 2024));
        assert!(parse_dispatch_date("2024-03-05").is_none());
    }

    #[test]
    fn legacy_numbers_and_codes() {
        assert_eq!(legacy_order_number("SN1"), "OLD-SN1");
        assert_eq!(asset_code_for("router", 6), "ROU-0007");
        assert_eq!(asset_code_for("Set Top Box", 0), "SET-0001");
    }
}
