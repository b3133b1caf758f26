// buyer.rs
use crate::agent::{Agent, Role};
use crate::behaviour::{Behaviour, Context, Cyclic, OneShot, Status};
use crate::config::Config;
use crate::directory::DirectoryRegistry;
use crate::display::{DisplayCommand, DisplayHandle};
use crate::logging::Logger;
use crate::mailbox::MessageBus;
use crate::message::{correlation_token, Message, Performative};
use crate::protocol::{
    self, Order, GET_PRODUCTS, INVENTORY_CAPABILITY, PRODUCT_LIST_CONVERSATION,
    PURCHASE_CONVERSATION,
};
use crate::state::ConversationState;
use crate::template::MessageTemplate;
use std::collections::HashSet;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State of the buyer agent.
pub struct Buyer {
    inventory: Option<String>,
    display: DisplayHandle,
    commands: Option<Receiver<DisplayCommand>>,
    purchase_timeout: Option<Duration>,
    /// Tokens of purchases given up on whose reply may still turn up.
    abandoned: HashSet<String>,
}

impl Buyer {
    pub fn new(
        display: DisplayHandle,
        commands: Receiver<DisplayCommand>,
        purchase_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inventory: None,
            display,
            commands: Some(commands),
            purchase_timeout,
            abandoned: HashSet::new(),
        }
    }

    /// The inventory agent found at startup, if any.
    pub fn inventory(&self) -> Option<&str> {
        self.inventory.as_deref()
    }

    /// Number of timed-out purchases still expecting a late reply.
    pub fn abandoned(&self) -> usize {
        self.abandoned.len()
    }
}

impl Role for Buyer {}

/// Creates the buyer agent. Commands from `commands` drive refreshes and purchases.
pub fn create(
    config: &Config,
    bus: Arc<MessageBus>,
    directory: Arc<DirectoryRegistry>,
    logger: Logger,
    display: DisplayHandle,
    commands: Receiver<DisplayCommand>,
) -> Agent<Buyer> {
    let buyer = Buyer::new(display, commands, config.purchase_timeout());
    let mut agent = Agent::new(&config.agents.buyer, buyer, bus, directory, logger)
        .with_tick(config.tick());
    agent.add_behaviour(OneShot::new("inventory-discovery", discover_inventory));
    agent.add_behaviour(Cyclic::new("display-commands", serve_commands));
    agent.add_behaviour(Cyclic::new("late-reply-drain", drain_late_replies));
    agent
}

/// Single lookup of the inventory service. A miss is reported, not retried.
fn discover_inventory(ctx: &mut Context<'_, Buyer>) {
    match ctx.search(INVENTORY_CAPABILITY).into_iter().next() {
        Some(inventory) => {
            ctx.logger()
                .info(&format!("Found Inventory Agent: {}", inventory.name));
            ctx.role_mut().inventory = Some(inventory.name);
            ctx.role().display.log("✓ Connected to Inventory System");
            request_product_list(ctx);
        }
        None => {
            ctx.logger().warn("Inventory Agent not found!");
            ctx.role().display.log("✗ Inventory Agent not found!");
        }
    }
}

fn serve_commands(ctx: &mut Context<'_, Buyer>) -> Status {
    let Some(commands) = &ctx.role().commands else {
        return Status::Blocked;
    };
    let command = match commands.try_recv() {
        Ok(command) => command,
        Err(TryRecvError::Empty) => return Status::Blocked,
        Err(TryRecvError::Disconnected) => {
            ctx.logger().info("Display closed, leaving the platform");
            ctx.role_mut().commands = None;
            ctx.do_delete();
            return Status::Progressed;
        }
    };

    match command {
        DisplayCommand::Refresh => request_product_list(ctx),
        DisplayCommand::Purchase {
            product_id,
            quantity,
        } => make_purchase(ctx, Order::new(product_id, quantity)),
    }
    Status::Progressed
}

/// Drops replies to purchases that already timed out, so they do not pile up in the mailbox.
fn drain_late_replies(ctx: &mut Context<'_, Buyer>) -> Status {
    if ctx.role().abandoned.is_empty() {
        return Status::Blocked;
    }
    let tokens: Vec<String> = ctx.role().abandoned.iter().cloned().collect();

    let mut progressed = false;
    for token in tokens {
        let template = MessageTemplate::conversation(PURCHASE_CONVERSATION)
            .and(MessageTemplate::in_reply_to(token.as_str()));
        if let Some(reply) = ctx.receive(&template) {
            ctx.logger().info(&format!(
                "Dropping late reply to {}: {}",
                token, reply.content
            ));
            ctx.role_mut().abandoned.remove(&token);
            progressed = true;
        }
    }

    if progressed {
        Status::Progressed
    } else {
        Status::Blocked
    }
}

/// Queues a catalog query: a one-shot send plus a behaviour waiting for its reply.
pub fn request_product_list(ctx: &mut Context<'_, Buyer>) {
    ctx.add_behaviour(OneShot::new("product-list-request", send_product_list_request));
}

pub fn make_purchase(ctx: &mut Context<'_, Buyer>, order: Order) {
    if order.quantity == 0 {
        ctx.role()
            .display
            .log("✗ Quantity must be greater than 0.");
        return;
    }
    let timeout = ctx.role().purchase_timeout;
    ctx.add_behaviour(PurchaseRequest::new(order, timeout));
}

fn send_product_list_request(ctx: &mut Context<'_, Buyer>) {
    let Some(inventory) = ctx.role().inventory.clone() else {
        ctx.role().display.log("✗ Inventory Agent not found!");
        return;
    };
    let token = correlation_token("list");
    let request = Message::new(Performative::Request, ctx.name())
        .to(inventory)
        .with_content(GET_PRODUCTS)
        .with_conversation(PRODUCT_LIST_CONVERSATION)
        .with_reply_with(token.clone());
    ctx.send(request);
    ctx.add_behaviour(ReceiveProductList::new(&token));
}

/// Waits for one catalog snapshot and hands it to the display.
pub struct ReceiveProductList {
    template: MessageTemplate,
    state: ConversationState,
}

impl ReceiveProductList {
    pub fn new(token: &str) -> Self {
        Self {
            template: MessageTemplate::conversation(PRODUCT_LIST_CONVERSATION)
                .and(MessageTemplate::in_reply_to(token)),
            state: ConversationState::SentAwaitingReply,
        }
    }
}

impl Behaviour<Buyer> for ReceiveProductList {
    fn name(&self) -> &str {
        "product-list-reply"
    }

    fn action(&mut self, ctx: &mut Context<'_, Buyer>) -> Status {
        if self.state == ConversationState::Done {
            return Status::Done;
        }
        let Some(reply) = ctx.receive(&self.template) else {
            return Status::Blocked;
        };

        if reply.performative == Performative::Inform {
            match protocol::decode_catalog(&reply.content) {
                Ok(products) => ctx.role().display.catalog(products),
                Err(e) => ctx.logger().warn(&format!("Ignoring catalog: {}", e)),
            }
        }
        self.state = ConversationState::Done;
        Status::Done
    }
}

/// Two-step purchase: send the request, then wait for the reply carrying its token.
pub struct PurchaseRequest {
    order: Order,
    state: ConversationState,
    token: Option<String>,
    template: Option<MessageTemplate>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl PurchaseRequest {
    pub fn new(order: Order, timeout: Option<Duration>) -> Self {
        Self {
            order,
            state: ConversationState::Start,
            token: None,
            template: None,
            timeout,
            deadline: None,
        }
    }

    fn send(&mut self, ctx: &mut Context<'_, Buyer>) -> Status {
        let Some(inventory) = ctx.role().inventory.clone() else {
            ctx.role()
                .display
                .outcome(false, "Inventory Agent not found!");
            self.state = ConversationState::Done;
            return Status::Done;
        };

        let token = correlation_token("purchase");
        let request = Message::new(Performative::Request, ctx.name())
            .to(inventory)
            .with_content(protocol::encode_purchase(&self.order))
            .with_conversation(PURCHASE_CONVERSATION)
            .with_reply_with(token.clone());
        ctx.send(request);
        ctx.role().display.log(format!(
            "Sending purchase request: {}x {}",
            self.order.quantity, self.order.product_id
        ));

        self.template = Some(
            MessageTemplate::conversation(PURCHASE_CONVERSATION)
                .and(MessageTemplate::in_reply_to(token.as_str())),
        );
        self.token = Some(token);
        self.deadline = self.timeout.map(|t| Instant::now() + t);
        self.state = ConversationState::SentAwaitingReply;
        Status::Progressed
    }

    fn await_reply(&mut self, ctx: &mut Context<'_, Buyer>) -> Status {
        let reply = self.template.as_ref().and_then(|t| ctx.receive(t));
        match reply {
            Some(reply) => {
                let display = &ctx.role().display;
                match reply.performative {
                    Performative::Inform => {
                        display.log(format!("✓ {}", reply.content));
                        display.outcome(true, reply.content);
                    }
                    Performative::Failure => {
                        display.log(format!("✗ {}", reply.content));
                        display.outcome(false, reply.content);
                    }
                    Performative::Request => ctx
                        .logger()
                        .warn(&format!("Unexpected purchase reply: {}", reply)),
                }
            }
            None => {
                if !self.deadline.is_some_and(|d| Instant::now() >= d) {
                    return Status::Blocked;
                }
                let text = format!(
                    "No reply to purchase of {}x {}, giving up",
                    self.order.quantity, self.order.product_id
                );
                ctx.role().display.log(format!("✗ {}", text));
                ctx.role().display.outcome(false, text);
                if let Some(token) = self.token.take() {
                    ctx.role_mut().abandoned.insert(token);
                }
            }
        }

        request_product_list(ctx);
        self.state = ConversationState::Done;
        Status::Done
    }
}

impl Behaviour<Buyer> for PurchaseRequest {
    fn name(&self) -> &str {
        "purchase-request"
    }

    fn action(&mut self, ctx: &mut Context<'_, Buyer>) -> Status {
        match self.state {
            ConversationState::Start => self.send(ctx),
            ConversationState::SentAwaitingReply => self.await_reply(ctx),
            ConversationState::Done => Status::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::AgentDescriptor;
    use crate::display::{self, DisplayEvent};
    use crate::mailbox::Mailbox;
    use crate::product::default_catalog;
    use std::sync::mpsc::{self, Sender};

    struct Harness {
        buyer: Agent<Buyer>,
        inventory: Arc<Mailbox>,
        commands: Sender<DisplayCommand>,
        events: Receiver<DisplayEvent>,
    }

    fn harness(with_inventory: bool, timeout_ms: Option<u64>) -> Harness {
        let bus = MessageBus::new();
        let directory = DirectoryRegistry::new();
        let inventory = Mailbox::new();
        bus.attach("InventoryAgent", inventory.clone());
        if with_inventory {
            directory.register(AgentDescriptor::new(
                "InventoryAgent",
                INVENTORY_CAPABILITY,
                "inventory-service",
            ));
        }

        let mut config = Config::default();
        config.purchase_timeout_ms = timeout_ms;
        let (display, events) = display::channel();
        let (commands, commands_rx) = mpsc::channel();
        let buyer = create(&config, bus, directory, Logger::quiet("buyer"), display, commands_rx);
        Harness {
            buyer,
            inventory,
            commands,
            events,
        }
    }

    fn drain(events: &Receiver<DisplayEvent>) -> Vec<DisplayEvent> {
        events.try_iter().collect()
    }

    fn take_request(inventory: &Mailbox, conversation: &str) -> Message {
        inventory
            .receive(&MessageTemplate::conversation(conversation))
            .expect("request")
    }

    #[test]
    fn test_startup_connects_and_queries_catalog() {
        let mut h = harness(true, None);
        h.buyer.run_pass();
        assert_eq!(h.buyer.role().inventory(), Some("InventoryAgent"));
        h.buyer.run_pass();

        let request = take_request(&h.inventory, PRODUCT_LIST_CONVERSATION);
        assert_eq!(request.content, "GET_PRODUCTS");
        assert!(request.reply_with.as_deref().unwrap().starts_with("list-"));

        let reply = request
            .create_reply(Performative::Inform, "InventoryAgent")
            .with_content(protocol::encode_catalog(&default_catalog()));
        h.buyer.mailbox().push(reply);
        h.buyer.run_pass();
        h.buyer.run_pass();

        let events = drain(&h.events);
        assert_eq!(
            events[0],
            DisplayEvent::Log("✓ Connected to Inventory System".to_string())
        );
        assert!(events.contains(&DisplayEvent::Catalog(default_catalog())));
        assert_eq!(h.buyer.behaviour_names(), vec!["display-commands", "late-reply-drain"]);
    }

    #[test]
    fn test_missing_inventory_is_reported_once() {
        let mut h = harness(false, None);
        for _ in 0..3 {
            h.buyer.run_pass();
        }
        assert_eq!(h.buyer.role().inventory(), None);
        assert_eq!(
            drain(&h.events),
            vec![DisplayEvent::Log("✗ Inventory Agent not found!".to_string())]
        );
        assert!(h.inventory.is_empty());
    }

    #[test]
    fn test_purchase_waits_for_its_own_reply() {
        let mut h = harness(true, None);
        h.buyer.run_pass();
        h.buyer.run_pass();
        take_request(&h.inventory, PRODUCT_LIST_CONVERSATION);

        for (id, qty) in [("LAPTOP001", 1), ("LAPTOP001", 2)] {
            h.commands
                .send(DisplayCommand::Purchase {
                    product_id: id.to_string(),
                    quantity: qty,
                })
                .unwrap();
            h.buyer.run_pass();
        }
        h.buyer.run_pass();

        let first = take_request(&h.inventory, PURCHASE_CONVERSATION);
        let second = take_request(&h.inventory, PURCHASE_CONVERSATION);
        assert_eq!(first.content, "PURCHASE:LAPTOP001:1");
        assert_eq!(second.content, "PURCHASE:LAPTOP001:2");
        assert_ne!(first.reply_with, second.reply_with);

        // Answer the second request first.
        h.buyer.mailbox().push(
            second
                .create_reply(Performative::Inform, "InventoryAgent")
                .with_content("Purchase successful! 2 x Dell Laptop. Remaining stock: 3"),
        );
        drain(&h.events);
        h.buyer.run_pass();

        let events = drain(&h.events);
        assert!(events.contains(&DisplayEvent::PurchaseOutcome {
            success: true,
            text: "Purchase successful! 2 x Dell Laptop. Remaining stock: 3".to_string(),
        }));
        assert_eq!(
            h.buyer
                .behaviour_names()
                .iter()
                .filter(|n| **n == "purchase-request")
                .count(),
            1
        );

        h.buyer.mailbox().push(
            first
                .create_reply(Performative::Failure, "InventoryAgent")
                .with_content("Insufficient stock! Available: 3, Requested: 1"),
        );
        h.buyer.run_pass();
        let events = drain(&h.events);
        assert!(events.contains(&DisplayEvent::Log(
            "✗ Insufficient stock! Available: 3, Requested: 1".to_string()
        )));
        assert!(!h.buyer.behaviour_names().contains(&"purchase-request"));
    }

    #[test]
    fn test_reply_triggers_catalog_refresh() {
        let mut h = harness(true, None);
        h.buyer.run_pass();
        h.buyer.run_pass();
        take_request(&h.inventory, PRODUCT_LIST_CONVERSATION);

        h.commands
            .send(DisplayCommand::Purchase {
                product_id: "TABLET001".to_string(),
                quantity: 1,
            })
            .unwrap();
        h.buyer.run_pass();
        h.buyer.run_pass();
        let request = take_request(&h.inventory, PURCHASE_CONVERSATION);
        h.buyer.mailbox().push(
            request
                .create_reply(Performative::Failure, "InventoryAgent")
                .with_content("Product not found: TABLET001"),
        );
        h.buyer.run_pass();
        h.buyer.run_pass();

        let refresh = take_request(&h.inventory, PRODUCT_LIST_CONVERSATION);
        assert_eq!(refresh.content, GET_PRODUCTS);
    }

    #[test]
    fn test_zero_quantity_is_rejected_locally() {
        let mut h = harness(true, None);
        h.buyer.run_pass();
        h.commands
            .send(DisplayCommand::Purchase {
                product_id: "LAPTOP001".to_string(),
                quantity: 0,
            })
            .unwrap();
        h.buyer.run_pass();
        h.buyer.run_pass();

        assert!(h
            .inventory
            .receive(&MessageTemplate::conversation(PURCHASE_CONVERSATION))
            .is_none());
        assert!(drain(&h.events)
            .contains(&DisplayEvent::Log("✗ Quantity must be greater than 0.".to_string())));
    }

    #[test]
    fn test_purchase_times_out_when_configured() {
        let mut h = harness(true, Some(0));
        h.buyer.run_pass();
        h.commands
            .send(DisplayCommand::Purchase {
                product_id: "LAPTOP001".to_string(),
                quantity: 1,
            })
            .unwrap();
        h.buyer.run_pass();
        h.buyer.run_pass();
        h.buyer.run_pass();

        let events = drain(&h.events);
        assert!(events.iter().any(|e| matches!(
            e,
            DisplayEvent::PurchaseOutcome { success: false, text } if text.contains("giving up")
        )));
        assert!(!h.buyer.behaviour_names().contains(&"purchase-request"));
    }

    #[test]
    fn test_late_replies_to_timed_out_purchases_are_dropped() {
        let mut h = harness(true, Some(0));
        h.buyer.run_pass();

        for _ in 0..50 {
            h.commands
                .send(DisplayCommand::Purchase {
                    product_id: "LAPTOP001".to_string(),
                    quantity: 1,
                })
                .unwrap();
            h.buyer.run_pass();
            h.buyer.run_pass();
            h.buyer.run_pass();

            let request = take_request(&h.inventory, PURCHASE_CONVERSATION);
            h.buyer.mailbox().push(
                request
                    .create_reply(Performative::Inform, "InventoryAgent")
                    .with_content("Purchase successful! 1 x Dell Laptop. Remaining stock: 4"),
            );
        }
        h.buyer.run_pass();

        assert!(h.buyer.mailbox().is_empty());
        assert_eq!(h.buyer.role().abandoned(), 0);
    }

    #[tokio::test]
    async fn test_closed_display_stops_the_buyer() {
        let Harness {
            buyer, commands, ..
        } = harness(true, None);
        drop(commands);

        let (_stop, stopped) = tokio::sync::watch::channel(false);
        let buyer = tokio::time::timeout(Duration::from_secs(2), buyer.run(stopped))
            .await
            .expect("buyer leaves once the display is gone");
        assert_eq!(buyer.inventory(), Some("InventoryAgent"));
    }

    #[test]
    fn test_purchase_waits_forever_by_default() {
        let mut h = harness(true, None);
        h.buyer.run_pass();
        h.commands
            .send(DisplayCommand::Purchase {
                product_id: "LAPTOP001".to_string(),
                quantity: 1,
            })
            .unwrap();
        for _ in 0..10 {
            h.buyer.run_pass();
        }
        assert!(h.buyer.behaviour_names().contains(&"purchase-request"));
    }
}
