use clap::Parser;
use client::game::Simulation;
use client::input::{Action, InputManager};
use client::network::{NetworkClient, NetworkEvent};
use client::rendering::Renderer;
use log::{error, info, warn};
use macroquad::prelude::next_frame;
use macroquad::window::Conf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3002")]
    server: String,

    /// Name shown above your capybara
    #[arg(short, long)]
    pseudo: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,

    /// Seed for fruit placement and effects
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: arrows to move, Space to eat at food zones, E to say hi");
    info!("Trades: T request, Y/N answer, G offer a fruit, C complete; pet: F feed, K walk");

    let network = NetworkClient::connect(&args.server)?;

    let conf = Conf {
        window_title: format!("Capybara Meadow - {}", args.pseudo),
        window_width: args.width as i32,
        window_height: args.height as i32,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, run(args, network));

    Ok(())
}

async fn run(args: Args, mut network: NetworkClient) {
    let mut sim = Simulation::new(
        args.width as f32,
        args.height as f32,
        args.pseudo,
        args.seed,
        Instant::now(),
    );
    let mut input = InputManager::new();
    let mut renderer = Renderer::new(args.width, args.height);
    let mut next_second = Instant::now() + Duration::from_secs(1);
    let mut link_lost = false;

    loop {
        for event in network.poll() {
            match event {
                NetworkEvent::Packet(packet) => {
                    for reply in sim.handle_packet(packet) {
                        network.send(reply);
                    }
                }
                NetworkEvent::Closed(reason) => {
                    warn!("Lost connection to relay: {}", reason);
                    link_lost = true;
                }
            }
        }

        let now = Instant::now();
        let (controls, actions) = input.update();

        for action in actions {
            let packet = match action {
                Action::Reset if sim.game_over => {
                    sim.reset(now);
                    None
                }
                Action::Reset => None,
                Action::Interact => sim.try_interact(),
                Action::RequestTrade => sim.request_trade(),
                Action::AcceptTrade => sim.answer_trade(true),
                Action::DeclineTrade => sim.answer_trade(false),
                Action::OfferItem => sim.offer_item(),
                Action::CompleteTrade => sim.complete_trade(),
                Action::FeedPet => sim.feed_pet(),
                Action::WalkPet => sim.walk_pet(),
            };
            if let Some(packet) = packet {
                network.send(packet);
            }
        }

        if let Some(update) = sim.step(&controls, now) {
            if !link_lost && !network.send(update) {
                error!("Network thread has stopped");
                link_lost = true;
            }
        }

        while now >= next_second {
            sim.tick_second();
            next_second += Duration::from_secs(1);
        }

        renderer.render(&sim);
        next_frame().await;
    }
}
