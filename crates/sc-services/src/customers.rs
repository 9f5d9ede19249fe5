//! Customer registration and appointment booking

use std::sync::Arc;

use sc_contracts::registrations::check_book_appointment;
use sc_contracts::{authorize, permissions, validate_input, Actor};
use sc_core::{Clock, ScError, ScResult};
use sc_db::CustomerStore;
use sc_models::{Appointment, Customer, IdCategory, NewAppointment, NewCustomer};

use crate::identifiers::IdentifierAllocator;

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
    ids: IdentifierAllocator,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        ids: IdentifierAllocator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            ids,
            clock,
        }
    }

    pub async fn register_customer(&self, actor: &dyn Actor, input: NewCustomer) -> ScResult<Customer> {
        authorize(actor, permissions::REGISTER_CUSTOMER, "register customers")?;
        validate_input(&input)?;

        let id = self.ids.allocate(IdCategory::Customer).await?;
        let customer = Customer {
            id: id.into_string(),
            name: input.name.trim().to_string(),
            email: input.email,
            phone: input.phone,
            created_at: self.clock.now(),
        };
        self.customers.insert_customer(&customer).await?;

        tracing::info!(customer_id = %customer.id, registered_by = %actor.id(), "customer registered");
        Ok(customer)
    }

    pub async fn book_appointment(
        &self,
        actor: &dyn Actor,
        customer_id: &str,
        input: NewAppointment,
    ) -> ScResult<Appointment> {
        check_book_appointment(actor, customer_id, &input)?;

        if self.customers.find_customer(customer_id).await?.is_none() {
            return Err(ScError::not_found("Customer", customer_id));
        }

        let id = self.ids.allocate(IdCategory::Appointment).await?;
        let appointment = Appointment {
            id: id.into_string(),
            customer_id: customer_id.to_string(),
            vehicle_id: input.vehicle_id,
            scheduled_for: input.scheduled_for,
            notes: input.notes,
            created_at: self.clock.now(),
        };
        self.customers.insert_appointment(&appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id,
            customer_id = %customer_id,
            "appointment booked"
        );
        Ok(appointment)
    }
}
