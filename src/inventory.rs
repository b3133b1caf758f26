// inventory.rs
use crate::agent::{Agent, Role};
use crate::behaviour::{Behaviour, Context, Cyclic, Status};
use crate::config::Config;
use crate::directory::DirectoryRegistry;
use crate::ledger::{CatalogStore, InventoryLedger, Sale};
use crate::logging::Logger;
use crate::mailbox::MessageBus;
use crate::message::{correlation_token, Message, Performative};
use crate::protocol::{
    self, GET_PRODUCTS, INVENTORY_CAPABILITY, PURCHASE_CONVERSATION, RESTOCK_CONVERSATION,
    SUPPLIER_CAPABILITY,
};
use crate::template::MessageTemplate;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State of the inventory agent: the ledger it alone mutates and the supplier it found.
#[derive(Debug)]
pub struct Inventory {
    pub ledger: InventoryLedger,
    supplier: Option<String>,
}

impl Inventory {
    pub fn new(ledger: InventoryLedger) -> Self {
        Self {
            ledger,
            supplier: None,
        }
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }
}

impl Role for Inventory {
    fn take_down(&mut self, _logger: &Logger) {
        self.ledger.save();
    }
}

/// Loads the catalog, registers the inventory service and installs the servers.
pub fn create(
    config: &Config,
    bus: Arc<MessageBus>,
    directory: Arc<DirectoryRegistry>,
    logger: Logger,
) -> Agent<Inventory> {
    let store = config.catalog_path.as_ref().map(CatalogStore::new);
    let ledger = InventoryLedger::open(store, config.initial_catalog.clone(), logger.clone());

    logger.info("Current inventory:");
    for product in ledger.products() {
        logger.info(&format!("  {}", product));
    }

    let mut agent = Agent::new(
        &config.agents.inventory,
        Inventory::new(ledger),
        bus,
        directory,
        logger,
    )
    .with_tick(config.tick());
    agent.register(INVENTORY_CAPABILITY, "inventory-service");
    agent.add_behaviour(SupplierDiscovery::new(config.discovery_retry()));
    agent.add_behaviour(Cyclic::new("purchase-request-server", serve_purchase));
    agent.add_behaviour(Cyclic::new("restock-confirmation-server", serve_restock_confirmation));
    agent.add_behaviour(Cyclic::new("product-list-server", serve_product_list));
    agent
}

/// Looks the supplier up, retrying after `retry` until one has registered.
pub struct SupplierDiscovery {
    retry: Duration,
    next_attempt: Instant,
}

impl SupplierDiscovery {
    pub fn new(retry: Duration) -> Self {
        Self {
            retry,
            next_attempt: Instant::now(),
        }
    }
}

impl Behaviour<Inventory> for SupplierDiscovery {
    fn name(&self) -> &str {
        "supplier-discovery"
    }

    fn action(&mut self, ctx: &mut Context<'_, Inventory>) -> Status {
        let now = Instant::now();
        if now < self.next_attempt {
            return Status::Blocked;
        }

        match ctx.search(SUPPLIER_CAPABILITY).into_iter().next() {
            Some(supplier) => {
                ctx.logger()
                    .info(&format!("Found Supplier Agent: {}", supplier.name));
                ctx.role_mut().supplier = Some(supplier.name);
                Status::Done
            }
            None => {
                ctx.logger()
                    .warn("Supplier Agent not found yet, will retry...");
                self.next_attempt = now + self.retry;
                Status::Blocked
            }
        }
    }
}

fn serve_purchase(ctx: &mut Context<'_, Inventory>) -> Status {
    let template = MessageTemplate::performative(Performative::Request)
        .and(MessageTemplate::conversation(PURCHASE_CONVERSATION));
    let Some(request) = ctx.receive(&template) else {
        return Status::Blocked;
    };
    ctx.logger()
        .info(&format!("Received request: {}", request.content));

    let order = match protocol::decode_purchase(&request.content) {
        Ok(order) => order,
        Err(e) => {
            ctx.logger().warn(&format!("Ignoring request: {}", e));
            return Status::Progressed;
        }
    };

    let outcome = ctx.role_mut().ledger.purchase(&order);
    match outcome {
        Ok(sale) => {
            let reply = request
                .create_reply(Performative::Inform, ctx.name())
                .with_content(sale.receipt());
            ctx.send(reply);
            ctx.logger().info(&format!(
                "Purchase processed: {} x {} (Stock: {})",
                sale.quantity, sale.product_name, sale.remaining
            ));
            request_restock(ctx, &sale);
        }
        Err(refusal) => {
            let reply = request
                .create_reply(Performative::Failure, ctx.name())
                .with_content(refusal.to_string());
            ctx.send(reply);
            ctx.logger().info(&refusal.to_string());
        }
    }
    Status::Progressed
}

/// Sends the restock a sale called for, once the buyer already has its reply.
fn request_restock(ctx: &mut Context<'_, Inventory>, sale: &Sale) {
    let Some(order) = &sale.restock_due else {
        return;
    };
    let Some(supplier) = ctx.role().supplier.clone() else {
        ctx.logger().warn(&format!(
            "Stock of {} below threshold but no supplier known yet",
            sale.product_name
        ));
        return;
    };

    let request = Message::new(Performative::Request, ctx.name())
        .to(supplier)
        .with_content(protocol::encode_restock(order))
        .with_conversation(RESTOCK_CONVERSATION)
        .with_reply_with(correlation_token("restock"));
    if !ctx.send(request) {
        // Left unmarked so the next sale below threshold asks again
        ctx.logger().warn(&format!(
            "Restock request for {} could not be delivered",
            sale.product_name
        ));
        return;
    }
    ctx.role_mut().ledger.mark_restock_requested(&order.product_id);
    ctx.logger().info(&format!(
        "Stock below threshold! Requesting restock: {} x {}",
        order.quantity, sale.product_name
    ));
}

/// Applies supplier confirmations. Correlated by the product id in the content only.
fn serve_restock_confirmation(ctx: &mut Context<'_, Inventory>) -> Status {
    let template = MessageTemplate::performative(Performative::Inform)
        .and(MessageTemplate::conversation(RESTOCK_CONVERSATION));
    let Some(confirmation) = ctx.receive(&template) else {
        return Status::Blocked;
    };

    let order = match protocol::decode_restocked(&confirmation.content) {
        Ok(order) => order,
        Err(e) => {
            ctx.logger().warn(&format!("Ignoring confirmation: {}", e));
            return Status::Progressed;
        }
    };

    let outcome = ctx.role_mut().ledger.restock(&order);
    match outcome {
        Ok(stock) => {
            let name = ctx
                .role()
                .ledger
                .get(&order.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            ctx.logger().info(&format!(
                "Stock replenished: {} x {} (New stock: {})",
                order.quantity, name, stock
            ));
        }
        Err(e) => ctx
            .logger()
            .warn(&format!("Ignoring confirmation: {}", e)),
    }
    Status::Progressed
}

fn serve_product_list(ctx: &mut Context<'_, Inventory>) -> Status {
    let template = MessageTemplate::content(GET_PRODUCTS);
    let Some(request) = ctx.receive(&template) else {
        return Status::Blocked;
    };

    let reply = request
        .create_reply(Performative::Inform, ctx.name())
        .with_content(protocol::encode_catalog(ctx.role().ledger.products()));
    ctx.send(reply);
    Status::Progressed
}
