use clap::{Args, ValueEnum};
use emporium_app::{
    auth::{AuthService, PgAuthService, Role},
    database::{self, Db},
    domain::users::records::UserUuid,
};
use jiff::Timestamp;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Customer,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Customer => Self::Customer,
            RoleArg::Admin => Self::Admin,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CreateSessionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User the session authenticates as
    #[arg(long)]
    user_uuid: Uuid,

    /// Session role
    #[arg(long, value_enum, default_value = "customer")]
    role: RoleArg,

    /// Optional session expiration timestamp (RFC 3339)
    #[arg(long)]
    expires_at: Option<String>,
}

pub(crate) async fn run(args: CreateSessionArgs) -> Result<(), String> {
    let expires_at = parse_expires_at(args.expires_at.as_deref())?;

    if let Some(expires_at) = expires_at.as_ref()
        && *expires_at <= Timestamp::now()
    {
        return Err("expires-at must be in the future".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAuthService::new(Db::new(pool));

    let issued = service
        .issue_session(UserUuid::from_uuid(args.user_uuid), args.role.into(), expires_at)
        .await
        .map_err(|error| format!("failed to create session: {error}"))?;

    println!("session_uuid: {}", issued.session.uuid);
    println!("user_uuid: {}", issued.session.user_uuid);
    println!("role: {}", issued.session.role);
    println!("session_created_at: {}", issued.session.created_at);
    if let Some(expires_at) = issued.session.expires_at {
        println!("session_expires_at: {expires_at}");
    }
    println!("bearer_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}

fn parse_expires_at(raw: Option<&str>) -> Result<Option<Timestamp>, String> {
    raw.map(|value| {
        value
            .parse::<Timestamp>()
            .map_err(|error| format!("invalid expires-at timestamp: {error}"))
    })
    .transpose()
}
