//! Admin-token command - mints a bearer token for the admin API

use clap::Args;

#[derive(Args, Clone, Debug)]
pub struct AdminTokenArgs {
    /// Subject recorded in the token
    #[arg(long, default_value = "admin")]
    pub subject: String,
}

pub fn run(args: AdminTokenArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::init_command_logging(&config);

    let jwt = crate::create_jwt_service(&config);
    let token = jwt.generate_admin_token(&args.subject)?;

    eprintln!("Token valid for {} hours", jwt.expiration_hours());
    println!("{}", token);

    Ok(())
}
