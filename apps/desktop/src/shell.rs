//! Interactive line-oriented front-end over [`InventoryController`].

use std::io::Write as _;

use anyhow::{anyhow, bail, Context};
use client_core::{InventoryApi, InventoryController};
use shared::domain::{MovementKind, ProductId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render::{render_product, render_snapshot};

const HELP: &str = "\
commands:
  list                 show the current product list
  refresh              refetch the product list
  sku <text>           set the draft sku
  name <text>          set the draft name
  submit               create a product from the draft
  new <sku> <name..>   set the draft and submit it
  sale <id>            record a one-unit sale
  receive <id> <qty>   record incoming stock
  help                 show this text
  quit                 leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Refresh,
    Sku(String),
    Name(String),
    Submit,
    New { sku: String, name: String },
    Sale(ProductId),
    Receive { product_id: ProductId, quantity: i64 },
    Help,
    Quit,
}

fn parse_product_id(raw: Option<&str>) -> anyhow::Result<ProductId> {
    let raw = raw.ok_or_else(|| anyhow!("missing product id"))?;
    let id = raw
        .parse::<i64>()
        .with_context(|| format!("invalid product id '{raw}'"))?;
    Ok(ProductId(id))
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let command = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List,
        "refresh" => ShellCommand::Refresh,
        "sku" => ShellCommand::Sku(rest.to_string()),
        "name" => ShellCommand::Name(rest.to_string()),
        "submit" => ShellCommand::Submit,
        "new" => {
            let Some((sku, name)) = rest.split_once(char::is_whitespace) else {
                bail!("usage: new <sku> <name>");
            };
            ShellCommand::New {
                sku: sku.to_string(),
                name: name.trim().to_string(),
            }
        }
        "sale" => ShellCommand::Sale(parse_product_id(args.next())?),
        "receive" => {
            let product_id = parse_product_id(args.next())?;
            let raw = args.next().ok_or_else(|| anyhow!("missing quantity"))?;
            let quantity = raw
                .parse::<i64>()
                .with_context(|| format!("invalid quantity '{raw}'"))?;
            ShellCommand::Receive {
                product_id,
                quantity,
            }
        }
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

async fn execute<A: InventoryApi>(
    controller: &mut InventoryController<A>,
    command: ShellCommand,
) -> String {
    match command {
        ShellCommand::List => render_snapshot(controller.snapshot()),
        ShellCommand::Refresh => match controller.refresh().await {
            Ok(()) => render_snapshot(controller.snapshot()),
            Err(err) => format!(
                "refresh failed: {err}\n{}",
                render_snapshot(controller.snapshot())
            ),
        },
        ShellCommand::Sku(sku) => {
            controller.draft_mut().sku = sku;
            render_draft(controller)
        }
        ShellCommand::Name(name) => {
            controller.draft_mut().name = name;
            render_draft(controller)
        }
        ShellCommand::Submit => {
            let outcome = controller.submit_draft().await;
            render_submission(controller, outcome)
        }
        ShellCommand::New { sku, name } => {
            let outcome = controller.submit_new_product(sku, name).await;
            render_submission(controller, outcome)
        }
        ShellCommand::Sale(product_id) => {
            let outcome = controller.record_quick_sale(product_id).await;
            render_movement(controller, outcome)
        }
        ShellCommand::Receive {
            product_id,
            quantity,
        } => {
            let outcome = controller
                .record_movement(product_id, MovementKind::In, quantity)
                .await;
            render_movement(controller, outcome)
        }
        ShellCommand::Help => HELP.to_string(),
        ShellCommand::Quit => String::new(),
    }
}

fn render_draft<A: InventoryApi>(controller: &InventoryController<A>) -> String {
    let draft = controller.draft();
    format!("draft: sku='{}' name='{}'\n", draft.sku, draft.name)
}

fn render_submission<A: InventoryApi>(
    controller: &InventoryController<A>,
    outcome: Result<shared::domain::Product, client_core::ControllerError>,
) -> String {
    match outcome {
        Ok(product) => format!(
            "created {}\n{}",
            render_product(&product),
            render_snapshot(controller.snapshot())
        ),
        Err(err) => format!("create failed: {err}\n{}", render_draft(controller)),
    }
}

fn render_movement<A: InventoryApi>(
    controller: &InventoryController<A>,
    outcome: Result<shared::protocol::MovementReceipt, client_core::ClientError>,
) -> String {
    let head = match outcome {
        Ok(receipt) => format!("movement {} {}\n", receipt.id, receipt.status),
        Err(err) => format!("movement failed: {err}\n"),
    };
    head + &render_snapshot(controller.snapshot())
}

pub async fn run_shell<A: InventoryApi>(
    controller: &mut InventoryController<A>,
) -> anyhow::Result<()> {
    if let Err(err) = controller.initialize().await {
        println!("initial refresh failed: {err}");
    }
    println!("{}", render_snapshot(controller.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };
        debug!(?command, "shell command");
        print!("{}", execute(controller, command).await);
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
