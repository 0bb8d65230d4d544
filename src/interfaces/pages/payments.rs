//! Payments: read-only list and detail

use super::form::{non_blank, Choice};
use super::list::ListQuery;
use crate::application::{DataProvider, Resource};
use crate::domain::{Filter, Payment, PaymentState, Sorter, User};
use crate::interfaces::display::{format_kes, format_optional_date};
use crate::shared::{AdminError, AdminResult};

pub const SEARCH_FIELDS: [&str; 2] = ["transaction_id", "receipt_number"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilters {
    pub search: String,
    pub status: Choice<PaymentState>,
    pub method: Choice<String>,
}

impl PaymentFilters {
    pub fn parse_method(value: &str) -> Option<String> {
        non_blank(value)
    }
}

impl ListQuery for PaymentFilters {
    type Row = Payment;
    const RESOURCE: Resource = Resource::Payments;

    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(term) = non_blank(&self.search) {
            filters.push(Filter::search(SEARCH_FIELDS, &term));
        }
        if let Some(status) = self.status.selected() {
            filters.push(Filter::eq("status", status.as_str()));
        }
        if let Some(method) = self.method.selected() {
            filters.push(Filter::eq("payment_method", method.as_str()));
        }
        filters
    }

    fn sorters(&self) -> Vec<Sorter> {
        vec![Sorter::desc("payment_date"), Sorter::desc("created_at")]
    }
}

pub struct PaymentShowPage {
    payment: Payment,
    student: Option<User>,
}

impl PaymentShowPage {
    /// The payer's profile is optional: a removed user still leaves the
    /// payment viewable.
    pub async fn load(data: DataProvider, id: &str) -> AdminResult<Self> {
        let payment: Payment = data.one(Resource::Payments, id).await?;
        let student = match data.one::<User>(Resource::Users, &payment.student_id).await {
            Ok(user) => Some(user),
            Err(AdminError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(Self { payment, student })
    }

    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    pub fn student_name(&self) -> &str {
        self.student
            .as_ref()
            .map(|u| u.full_name.as_str())
            .unwrap_or(&self.payment.student_id)
    }

    pub fn amount(&self) -> String {
        format_kes(self.payment.amount)
    }

    pub fn paid_on(&self) -> String {
        format_optional_date(self.payment.payment_date)
    }

    pub fn receipt(&self) -> &str {
        self.payment.receipt_number.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowStore;
    use crate::interfaces::pages::fixtures;
    use crate::interfaces::pages::list::ListController;
    use serde_json::json;

    async fn seed_payments(fx: &fixtures::Fixture) -> Vec<String> {
        let mut ids = Vec::new();
        for (tx, receipt, method, status, amount) in [
            ("QK7H2LMN01", Some("RCP-001"), "mpesa", "completed", 15000),
            ("QK7H2LMN02", None, "mpesa", "pending", 20000),
            ("CARD-5521", Some("RCP-003"), "card", "failed", 15000),
        ] {
            let row = fx
                .rows
                .insert(
                    "payments",
                    json!({
                        "enrollment_id": "e1", "student_id": fx.user_id, "amount": amount,
                        "payment_method": method, "status": status,
                        "transaction_id": tx, "receipt_number": receipt,
                        "payment_date": "2025-03-01T09:00:00+00:00"
                    }),
                )
                .await
                .unwrap();
            ids.push(row["id"].as_str().unwrap().to_string());
        }
        ids
    }

    #[tokio::test]
    async fn search_covers_transaction_and_receipt() {
        let fx = fixtures::admin().await;
        seed_payments(&fx).await;
        let mut list: ListController<PaymentFilters> = ListController::new(fx.data());

        list.update_query(|q| q.search = "qk7h".into()).await.unwrap();
        assert_eq!(list.total(), 2);
        list.update_query(|q| q.search = "RCP-003".into()).await.unwrap();
        assert_eq!(list.total(), 1);
        assert_eq!(list.rows()[0].status, PaymentState::Failed);

        list.update_query(|q| {
            q.search.clear();
            q.method = Choice::from_select("mpesa", PaymentFilters::parse_method);
            q.status = Choice::Only(PaymentState::Completed);
        })
        .await
        .unwrap();
        assert_eq!(list.total(), 1);
    }

    #[tokio::test]
    async fn show_formats_amount_and_payer() {
        let fx = fixtures::admin().await;
        let ids = seed_payments(&fx).await;
        let page = PaymentShowPage::load(fx.data(), &ids[0]).await.unwrap();
        assert_eq!(page.amount(), "KES 15,000.00");
        assert_eq!(page.student_name(), "Staff Member");
        assert_eq!(page.paid_on(), "Mar 1, 2025");
        assert_eq!(page.receipt(), "RCP-001");

        let page = PaymentShowPage::load(fx.data(), &ids[1]).await.unwrap();
        assert_eq!(page.receipt(), "-");
    }

    #[tokio::test]
    async fn missing_payment_is_not_found() {
        let fx = fixtures::admin().await;
        let err = PaymentShowPage::load(fx.data(), "nope").await.err().unwrap();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }
}
