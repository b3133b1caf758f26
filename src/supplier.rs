// supplier.rs
use crate::agent::{Agent, Role};
use crate::behaviour::{Context, Cyclic, Status};
use crate::config::Config;
use crate::directory::DirectoryRegistry;
use crate::logging::Logger;
use crate::mailbox::MessageBus;
use crate::message::{Message, Performative};
use crate::protocol::{self, Order, RESTOCK_CONVERSATION, SUPPLIER_CAPABILITY};
use crate::template::MessageTemplate;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A confirmation waiting for its simulated fulfilment time.
#[derive(Debug)]
struct Fulfillment {
    due: Instant,
    order: Order,
    confirmation: Message,
}

/// Fulfils restock requests after a fixed delay.
#[derive(Debug)]
pub struct Supplier {
    delay: Duration,
    pending: VecDeque<Fulfillment>,
}

impl Supplier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Role for Supplier {}

/// Creates the supplier agent and registers its service.
pub fn create(
    config: &Config,
    bus: Arc<MessageBus>,
    directory: Arc<DirectoryRegistry>,
    logger: Logger,
) -> Agent<Supplier> {
    let mut agent = Agent::new(
        &config.agents.supplier,
        Supplier::new(config.restock_delay()),
        bus,
        directory,
        logger,
    )
    .with_tick(config.tick());
    agent.register(SUPPLIER_CAPABILITY, "supplier-restock");
    agent.add_behaviour(Cyclic::new("restock-request-server", serve_restock));
    agent
}

/// Accepts one restock request per pass and sends every confirmation that is due.
/// Waiting for a fulfilment never holds up the scheduler.
fn serve_restock(ctx: &mut Context<'_, Supplier>) -> Status {
    let mut progressed = false;

    let template = MessageTemplate::performative(Performative::Request)
        .and(MessageTemplate::conversation(RESTOCK_CONVERSATION));
    if let Some(request) = ctx.receive(&template) {
        progressed = true;
        ctx.logger()
            .info(&format!("Received restock request: {}", request.content));
        match protocol::decode_restock(&request.content) {
            Ok(order) => {
                let confirmation = request
                    .create_reply(Performative::Inform, ctx.name())
                    .with_content(protocol::encode_restocked(&order));
                let due = Instant::now() + ctx.role().delay;
                ctx.role_mut().pending.push_back(Fulfillment {
                    due,
                    order,
                    confirmation,
                });
            }
            Err(e) => ctx.logger().warn(&format!("Ignoring request: {}", e)),
        }
    }

    let now = Instant::now();
    while ctx.role().pending.front().is_some_and(|f| f.due <= now) {
        let Some(fulfillment) = ctx.role_mut().pending.pop_front() else {
            break;
        };
        ctx.send(fulfillment.confirmation);
        ctx.logger().info(&format!(
            "Restock completed: {} units of {}",
            fulfillment.order.quantity, fulfillment.order.product_id
        ));
        progressed = true;
    }

    if progressed {
        Status::Progressed
    } else {
        Status::Blocked
    }
}
