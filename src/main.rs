mod config;
mod database;
mod models;
mod server;
mod timing;

use std::sync::Arc;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::net::TcpListener;

use config::Config;
use database::sqlite::SqliteDatabase;
use server::server::Server;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const TIME_FORMAT: &str = "%H:%M";

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::load("config.json");

    let manager = SqliteConnectionManager::file(&config.database_path);
    let pool = r2d2::Pool::builder().build(manager).unwrap();
    let pool = Arc::new(pool);

    {
        let connection = pool.get().unwrap();
        SqliteDatabase::create_tables(&connection).unwrap();
    }

    let server = Server::setup(pool.clone());

    let listener = TcpListener::bind(&config.bind_address).await.unwrap();
    log::info!("Listening on {}", config.bind_address);

    loop {
        let (stream, _) = listener.accept().await.unwrap();
        let io = TokioIo::new(stream);
        let server_clone = server.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, server_clone)
                .await
            {
                log::error!("{}", err);
            }
        });
    }
}
