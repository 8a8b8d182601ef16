use crate::domain::customer::Customer;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BalanceRow<'a> {
    owner: &'a str,
    customer: &'a str,
    name: &'a str,
    balance: String,
}

/// Writes final per-customer balances as CSV.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_customers(&mut self, mut customers: Vec<Customer>) -> Result<()> {
        // Stable output regardless of map iteration order.
        customers.sort_by(|a, b| (a.owner, &a.name).cmp(&(b.owner, &b.name)));
        for customer in &customers {
            self.writer.serialize(BalanceRow {
                owner: &customer.owner.to_string(),
                customer: &customer.id.to_string(),
                name: &customer.name,
                balance: format!("{:.2}", customer.balance.value()),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
