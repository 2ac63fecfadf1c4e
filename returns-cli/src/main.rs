//! # Returns Desk CLI
//!
//! Command-line interface for the returns support agent.
//!
//! Usage:
//!   returns                      run the built-in example questions
//!   returns chat                 interactive conversation
//!   returns ask <question>...    one question, one answer
//!   returns orders               list the demo orders
//!   returns policy [category]    print the return policy
//!
//! Examples:
//!   returns ask "Can I return order ORD-002?"
//!   returns --provider openai --model gpt-4o-mini chat
//!   RUST_LOG=returns_agent=debug returns -q

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use returns_agent::{Agent, AgentConfig, Session, Termination, TurnOutcome, DEFAULT_MAX_CYCLES};
use returns_core::{
    HttpProvider, LlmProvider, OrderStore, PolicyFacts, ProviderConfig, ProviderType,
    ToolRegistry,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const EXAMPLE_QUERIES: [&str; 3] = [
    "I want to return my order ORD-001. Can I still return it?",
    "Can I return order ORD-004? I'm not happy with it.",
    "What is your return policy for electronics?",
];

const RULE: &str = "============================================================";

#[derive(Parser)]
#[command(name = "returns")]
#[command(author, version, about = "Returns desk - a customer support agent for product returns")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// LLM backend
    #[arg(long, value_enum, default_value_t = ProviderKind::Anthropic, global = true)]
    provider: ProviderKind,

    /// Model name (default: the provider's default model)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Maximum LLM calls per question
    #[arg(long, default_value_t = DEFAULT_MAX_CYCLES, global = true)]
    max_cycles: u32,

    /// HTTP timeout for each LLM call, in seconds
    #[arg(long, default_value_t = 120, global = true)]
    timeout: u64,

    /// Quiet mode - only show final answers
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output (debug logs and token usage)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent until quit, exit, q or end of input
    Chat,
    /// Ask a single question
    Ask {
        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// List the demo orders
    Orders,
    /// Print the return policy
    Policy {
        /// Product category (electronics, accessories, ...)
        category: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    Anthropic,
    Openai,
}

impl From<ProviderKind> for ProviderType {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Anthropic => ProviderType::Anthropic,
            ProviderKind::Openai => ProviderType::OpenAI,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((at, _)) => format!("{}…", &s[..at]),
        None => s.to_string(),
    }
}

/// Build the agent, or exit before any conversation starts
fn build_agent(cli: &Cli, store: Arc<OrderStore>, today: NaiveDate) -> Agent<HttpProvider> {
    let built = ProviderConfig::from_env(cli.provider.into())
        .map(|config| {
            let mut config = config.with_timeout(cli.timeout);
            if let Some(model) = &cli.model {
                config = config.with_model(model.clone());
            }
            if let Some(url) = &cli.base_url {
                config = config.with_base_url(url.clone());
            }
            config
        })
        .and_then(HttpProvider::from_config)
        .and_then(|provider| {
            let tools = ToolRegistry::returns_desk(store, PolicyFacts::new(), today);
            let mut config = AgentConfig::default().with_max_cycles(cli.max_cycles);
            if let Some(model) = &cli.model {
                config = config.with_model(model.clone());
            }
            Agent::new(provider, tools).with_today(today).with_config(config)
        });

    match built {
        Ok(agent) => {
            tracing::debug!(
                provider = agent.provider().name(),
                model = cli.model.as_deref().unwrap_or(agent.provider().default_model()),
                max_cycles = cli.max_cycles,
                "agent ready"
            );
            agent
        }
        Err(e) => {
            eprintln!("Error: {}", e.message());
            if e.kind() == returns_core::ErrorKind::ConfigInvalid {
                eprintln!("Set it in your environment or in a .env file and try again.");
            }
            std::process::exit(1);
        }
    }
}

fn print_steps<W: Write>(out: &mut W, outcome: &TurnOutcome) -> io::Result<()> {
    for (i, step) in outcome.steps.iter().enumerate() {
        writeln!(out, "--- Step {}: {} ---", i + 1, step.call.name)?;
        writeln!(out, "  Tool call: {}({})", step.call.name, step.call.arguments)?;
        let status = if step.result.success { "" } else { " [failed]" };
        writeln!(out, "  Tool result{}: {}", status, truncate(&step.result.content(), 400))?;
    }
    if !outcome.steps.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn print_outcome<P: LlmProvider>(cli: &Cli, agent: &Agent<P>, session: &Session, outcome: &TurnOutcome) {
    if !cli.quiet {
        print_steps(&mut io::stdout(), outcome).ok();
    }
    println!("{}", outcome.answer);

    if outcome.termination == Termination::CycleLimit && !cli.quiet {
        println!("\n(stopped after {} model calls)", outcome.cycles);
    }

    if cli.verbose {
        let usage = session.usage();
        println!(
            "\n[{} | {} calls this turn | {} tokens this turn | {} tokens this session]",
            agent.provider().name(),
            outcome.cycles,
            outcome.usage.total_tokens,
            usage.total_tokens()
        );
    }
}

async fn ask<P: LlmProvider>(cli: &Cli, agent: &Agent<P>, question: &str) -> bool {
    let mut session = Session::new();

    if !cli.quiet {
        println!("\n{}", RULE);
        println!("Customer: {}", question);
        println!("{}\n", RULE);
    }

    match agent.submit(&mut session, question).await {
        Ok(outcome) => {
            print_outcome(cli, agent, &session, &outcome);
            true
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            false
        }
    }
}

async fn run_examples<P: LlmProvider>(cli: &Cli, agent: &Agent<P>) -> bool {
    if !cli.quiet {
        println!("Returns desk - running {} example questions", EXAMPLE_QUERIES.len());
    }
    let mut all_ok = true;
    for query in EXAMPLE_QUERIES {
        all_ok &= ask(cli, agent, query).await;
    }
    all_ok
}

/// Run the chat loop over `reader`, writing the conversation to `out`
async fn chat<P, R, W>(
    cli: &Cli,
    agent: &Agent<P>,
    store: &OrderStore,
    today: NaiveDate,
    reader: R,
    out: &mut W,
) -> returns_core::Result<Session>
where
    P: LlmProvider,
    R: BufRead,
    W: Write,
{
    writeln!(out, "\n{}", RULE)?;
    writeln!(out, "Customer Support Agent - Product Returns")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "\nOrder IDs you can ask about:")?;
    for order in store.orders() {
        writeln!(
            out,
            "  - {}: {} (purchased {})",
            order.order_id,
            order.product_name,
            order.purchase_date(today)
        )?;
    }
    writeln!(out, "\nType 'quit' to exit\n")?;

    let mut session = Session::new();
    let mut lines = reader.lines();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(out)?;
            break;
        };

        let input = line.trim();
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.submit(&mut session, input).await {
            Ok(outcome) => {
                writeln!(out)?;
                if !cli.quiet {
                    print_steps(out, &outcome)?;
                }
                writeln!(out, "Agent: {}\n", outcome.answer)?;
                if cli.verbose {
                    writeln!(out, "[{} tokens so far]\n", session.usage().total_tokens())?;
                }
            }
            Err(e) if e.kind().is_upstream() => {
                eprintln!("\nError: {}", e);
                eprintln!("The assistant could not be reached. Your message was not recorded; try again.\n");
            }
            Err(e) => {
                eprintln!("\nError: {}", e);
                eprintln!("Your message was not recorded; try again.\n");
            }
        }
    }

    writeln!(out, "\nThank you for contacting the returns desk. Goodbye!\n")?;
    Ok(session)
}

fn print_orders(store: &OrderStore, today: NaiveDate) {
    println!(
        "{:<8} {:<30} {:<15} {:<12} {:>8} {:>5}  {}",
        "ORDER", "PRODUCT", "CUSTOMER", "CATEGORY", "PRICE", "DAYS", "RETURNABLE"
    );
    for order in store.orders() {
        println!(
            "{:<8} {:<30} {:<15} {:<12} {:>8} {:>5}  {}",
            order.order_id,
            order.product_name,
            order.customer_name,
            order.category,
            format!("${}", order.price),
            order.days_since_purchase,
            if order.eligible { "yes" } else { "no" }
        );
    }
    println!("\nPurchase dates are relative to {}.", today);
}

fn print_policy(category: Option<&str>) {
    let facts = PolicyFacts::new();
    match category {
        Some(category) => {
            let policy = facts.for_category(category);
            println!("Return policy for {}:", policy.category);
            println!("  Return window:  {} days", policy.return_window_days);
            println!("  Condition:      {}", policy.condition_required);
            println!("  Refund type:    {}", policy.refund_type);
            println!("  Restocking:     {}", policy.restocking_fee);
        }
        None => println!("{}", facts.policy_text()),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let today = Local::now().date_naive();
    let store = Arc::new(OrderStore::seeded());

    match &cli.command {
        Some(Commands::Orders) => {
            print_orders(&store, today);
            return;
        }
        Some(Commands::Policy { category }) => {
            print_policy(category.as_deref());
            return;
        }
        _ => {}
    }

    let agent = build_agent(&cli, Arc::clone(&store), today);

    let ok = match &cli.command {
        Some(Commands::Chat) => {
            let stdin = io::stdin();
            match chat(&cli, &agent, &store, today, stdin.lock(), &mut io::stdout()).await {
                Ok(session) => {
                    tracing::debug!(session = %session.id(), turns = session.transcript().len(), "chat ended");
                    true
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    false
                }
            }
        }
        Some(Commands::Ask { question }) => ask(&cli, &agent, &question.join(" ")).await,
        _ => run_examples(&cli, &agent).await,
    };

    if !ok {
        std::process::exit(1);
    }
}
