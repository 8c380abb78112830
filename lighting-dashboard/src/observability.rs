use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "lighting_dashboard=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
