//! Response rendering: turns engine outcomes into the JSON wire shapes.
//! Kept in the server crate, not the engine, because the engine itself owns
//! no JSON framing beyond what the bulk loader and insert/update paths need.

use serde_json::{json, Map, Value};

use accounts_engine::account::Account;
use accounts_engine::filter::Projection;
use accounts_engine::group::GroupRow;
use accounts_engine::recommend::RecommendedAccount;
use accounts_engine::store::AccountStore;
use accounts_engine::suggest::SuggestedAccount;

fn phone_wire(phone: accounts_engine::account::Phone) -> String {
    format!("8({:03}){:07}", phone.code, phone.subscriber)
}

/// Renders one filter result row: `id`/`email` always, plus whatever
/// [`Projection`] says was touched by the matching filters.
#[must_use]
pub fn render_filter_row(account: &Account, accounts: &AccountStore, projection: &Projection) -> Value {
    let mut fields = Map::new();
    fields.insert("id".into(), json!(account.id));
    fields.insert("email".into(), json!(account.email));
    if projection.fname {
        fields.insert("fname".into(), json!(account.fname));
    }
    if projection.sname {
        fields.insert("sname".into(), json!(account.sname));
    }
    if projection.phone {
        fields.insert("phone".into(), json!(account.phone.map(phone_wire)));
    }
    if projection.sex {
        fields.insert("sex".into(), json!(account.sex.as_str()));
    }
    if projection.birth {
        fields.insert("birth".into(), json!(account.birth));
    }
    if projection.country {
        fields.insert(
            "country".into(),
            json!(accounts.resolve_country(account.country)),
        );
    }
    if projection.city {
        fields.insert("city".into(), json!(accounts.resolve_city(account.city)));
    }
    if projection.status {
        fields.insert("status".into(), json!(account.status.as_str()));
    }
    if projection.premium {
        fields.insert(
            "premium".into(),
            json!({
                "start": account.premium_start,
                "finish": account.premium_end,
            }),
        );
    }
    Value::Object(fields)
}

/// Renders one group-by output row: its key/value fields plus `count`.
#[must_use]
pub fn render_group_row(row: &GroupRow) -> Value {
    let mut fields = Map::new();
    for (name, value) in &row.fields {
        fields.insert((*name).to_string(), json!(value));
    }
    fields.insert("count".into(), json!(row.count));
    Value::Object(fields)
}

/// Renders one recommend result row (projection).
#[must_use]
pub fn render_recommended(account: &RecommendedAccount) -> Value {
    json!({
        "id": account.id,
        "email": account.email,
        "status": account.status.as_str(),
        "fname": account.fname,
        "sname": account.sname,
        "birth": account.birth,
        "premium": {
            "start": account.premium_start,
            "finish": account.premium_end,
        },
    })
}

/// Renders one suggest result row (projection).
#[must_use]
pub fn render_suggested(account: &SuggestedAccount) -> Value {
    json!({
        "id": account.id,
        "email": account.email,
        "status": account.status.as_str(),
        "fname": account.fname,
        "sname": account.sname,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_engine::account::{Sex, Status};

    fn sample_account() -> Account {
        Account {
            id: 1,
            email: "a@x.ru".into(),
            fname: Some("A".into()),
            sname: None,
            phone: None,
            sex: Sex::Male,
            birth: 0,
            joined: 0,
            status: Status::Single,
            premium_start: 0,
            premium_end: 0,
            premium_now: false,
            city: 0,
            country: 0,
        }
    }

    #[test]
    fn renders_only_projected_fields_plus_id_and_email() {
        let account = sample_account();
        let accounts = AccountStore::new(0);
        let projection = Projection::default();
        let value = render_filter_row(&account, &accounts, &projection);
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["id"], json!(1));
        assert_eq!(object["email"], json!("a@x.ru"));
    }

    #[test]
    fn sex_projection_renders_wire_literal() {
        let account = sample_account();
        let accounts = AccountStore::new(0);
        let projection = Projection {
            sex: true,
            ..Projection::default()
        };
        let value = render_filter_row(&account, &accounts, &projection);
        assert_eq!(value["sex"], json!("m"));
    }
}
