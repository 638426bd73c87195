use anyhow::Context;
use withdami_api::{AdminId, AuthToken, CommentId, NewAdmin, NewSession, Store, Uuid};
use withdami_client::Client;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Create an admin account
    CreateAdmin {
        /// Admin name
        name: String,

        /// Initial password
        initial_password: String,
    },

    /// Make a comment visible again
    ApproveComment {
        #[structopt(flatten)]
        login: Login,

        /// Comment id
        comment: Uuid,
    },

    /// Delete a comment for good (its replies stay, as top-level comments)
    DeleteComment {
        #[structopt(flatten)]
        login: Login,

        /// Comment id
        comment: Uuid,
    },
}

#[derive(structopt::StructOpt)]
struct Login {
    /// Admin name to log in as
    #[structopt(short, long)]
    user: String,

    /// Password
    #[structopt(short, long)]
    password: String,
}

fn admin_token() -> anyhow::Result<AuthToken> {
    let tok =
        std::env::var("ADMIN_TOKEN").context("retrieving ADMIN_TOKEN environment variable")?;
    let tok = Uuid::try_parse(&tok).context("parsing ADMIN_TOKEN as an auth token")?;
    Ok(AuthToken(tok))
}

async fn login(host: String, l: Login) -> anyhow::Result<Client> {
    let mut client = Client::new(host);
    client
        .auth(NewSession::new(
            l.user,
            l.password,
            format!("withdami-ctl on {}", whoami::devicename()),
        ))
        .await
        .context("logging in")?;
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    match opt.cmd {
        Command::CreateAdmin {
            name,
            initial_password,
        } => {
            Client::new(opt.host)
                .create_admin(
                    NewAdmin {
                        id: AdminId(Uuid::new_v4()),
                        name,
                        initial_password,
                    },
                    admin_token()?,
                )
                .await
                .context("creating admin")?;
        }
        Command::ApproveComment { login: l, comment } => {
            let mut client = login(opt.host, l).await?;
            let res = client.set_approved(CommentId(comment), true).await;
            client.unauth().await.context("logging back out")?;
            res.context("approving comment")?;
        }
        Command::DeleteComment { login: l, comment } => {
            let mut client = login(opt.host, l).await?;
            let res = client.delete(CommentId(comment)).await;
            client.unauth().await.context("logging back out")?;
            res.context("deleting comment")?;
        }
    }

    Ok(())
}
