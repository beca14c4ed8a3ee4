use sahp_rs::sahp::settings::settings;

fn main() {
    println!("sahp-rs starting...");

    // Load settings to verify basic functionality
    let config = settings();
    println!("Default seed: {}", config.model.default_seed);
    println!("Monte Carlo samples: {}", config.model.mc_samples);

    println!("sahp-rs initialized successfully!");
}
