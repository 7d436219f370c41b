use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderSettledEvent,
    OrderStatusChangedEvent,
    PaymentAppliedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The publishing side of the registered hooks. Cheap to clone; hand one to each API.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_applied_producer: Vec<EventProducer<PaymentAppliedEvent>>,
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
}

impl EventProducers {
    pub async fn publish_payment_applied(&self, event: PaymentAppliedEvent) {
        for emitter in &self.payment_applied_producer {
            trace!("📬️ Notifying payment applied hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        for emitter in &self.order_settled_producer {
            trace!("📬️ Notifying order settled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for emitter in &self.order_status_changed_producer {
            trace!("📬️ Notifying order status hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_payment_applied: Option<EventHandler<PaymentAppliedEvent>>,
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_applied = hooks.on_payment_applied.map(|f| EventHandler::new(buffer_size, f));
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_applied, on_order_settled, on_order_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_applied {
            result.payment_applied_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for each registered handler. Each task ends once all of its producers have been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_payment_applied {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_settled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_applied: Option<Handler<PaymentAppliedEvent>>,
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_payment_applied<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentAppliedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payment_applied = Some(Arc::new(f));
        self
    }

    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }
}
