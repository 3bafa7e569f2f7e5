use anyhow::Result;
use script_storyboard::orchestrator::App;
use script_storyboard::utils::logging;
use script_storyboard::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // .env 文件存在时载入，不存在也不报错
    dotenvy::dotenv().ok();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
