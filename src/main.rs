use chrono::{Datelike, Utc};
use clap::Parser;
use proptech_funding::config::{Command, QueryArgs};
use proptech_funding::core::aggregate::build_dashboard;
use proptech_funding::core::query::{filter_options, query_records};
use proptech_funding::core::stage::funding_rounds;
use proptech_funding::domain::ports::ConfigProvider;
use proptech_funding::domain::report::{CategoryCount, Dashboard};
use proptech_funding::utils::error::ErrorSeverity;
use proptech_funding::utils::format::{currency_or_na, decimal_or_na, format_currency};
use proptech_funding::utils::{logger, validation::Validate};
use proptech_funding::{
    AppConfig, CliConfig, FundingService, LocalStorage, NormalizedRecord, RecordId, ReportEngine,
    ReportPipeline, RestRecordStore, Result, Session,
};

const TABLE_COLUMNS: [(&str, usize); 5] = [
    ("Name", 28),
    ("Prop Type", 16),
    ("Location", 22),
    ("Founded", 8),
    ("Total Funding", 16),
];

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,      // 找不到資料
            ErrorSeverity::Medium => 2,   // 可重試
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 配置或系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };

    // CLI 參數優先於設定檔
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = Some(token.clone());
    }
    if let Command::Export {
        output_path,
        formats,
        no_compress,
        ..
    } = &cli.command
    {
        if let Some(path) = output_path {
            config.export.output_path = path.clone();
        }
        if !formats.is_empty() {
            config.export.output_formats = formats.clone();
        }
        if *no_compress {
            config.export.compress = false;
        }
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = load_config(&cli)?;
    let timeout = config.request_timeout();

    if let Command::Login { email, password } = &cli.command {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        let session = Session::login(&client, &config.api.base_url, email, password).await?;
        if let Some(token) = session.token() {
            println!("{}", token);
        }
        return Ok(());
    }

    // 建立 session，之後所有請求共用
    let mut session = Session::new(&config.api.base_url)?;
    if let Some(token) = config.token() {
        session = session.with_token(token);
    }
    tracing::debug!("Using {:?}", session);

    let store = RestRecordStore::new(session, timeout)?;

    match cli.command {
        Command::List { query, limit } => {
            let service = FundingService::new(store);
            let records = service.refresh().await?;
            let rows = select(&records, &query, &config);
            print_table(&rows, limit);
        }
        Command::Show { id } => {
            let service = FundingService::new(store);
            let record = service.get(&RecordId::new(id)).await?;
            print_record(&record);
        }
        Command::Dashboard { query } => {
            let service = FundingService::new(store);
            let records = service.refresh().await?;
            let rows = select(&records, &query, &config);
            print_dashboard(&build_dashboard(&rows, Utc::now().year()), &rows);
        }
        Command::Options { field } => {
            let service = FundingService::new(store);
            let records = service.refresh().await?;
            for value in filter_options(&records, &field) {
                println!("{}", value);
            }
        }
        Command::Add { record } => {
            let service = FundingService::new(store);
            let created = service.create(&record.to_record()?).await?;
            println!("✅ Created {} ({})", created.display("Name"), created.id);
        }
        Command::Update { id, record } => {
            let service = FundingService::new(store);
            let updated = service.update(&RecordId::new(id), &record.to_record()?).await?;
            println!("✅ Updated {} ({})", updated.display("Name"), updated.id);
        }
        Command::Delete { id } => {
            let service = FundingService::new(store);
            let message = service.delete(&RecordId::new(id)).await?;
            println!("✅ {}", message);
        }
        Command::Export { query, .. } => {
            let spec = query.to_query(&config);
            let storage = LocalStorage::new(config.export.output_path.clone());
            let pipeline = ReportPipeline::new(store, storage, config, spec);

            let output_path = ReportEngine::new(pipeline).run().await?;
            println!("✅ Report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Command::Login { .. } => {}
    }

    Ok(())
}

fn select(records: &[NormalizedRecord], args: &QueryArgs, config: &AppConfig) -> Vec<NormalizedRecord> {
    let spec = args.to_query(config);
    let rows: Vec<NormalizedRecord> = query_records(records, &spec).into_iter().cloned().collect();
    tracing::info!("🔍 {} of {} entries match", rows.len(), records.len());
    rows
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn print_table(rows: &[NormalizedRecord], limit: Option<usize>) {
    let header: Vec<String> = TABLE_COLUMNS
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = *width))
        .collect();
    println!("{}", header.join(" "));

    for row in rows.iter().take(limit.unwrap_or(usize::MAX)) {
        let line: Vec<String> = TABLE_COLUMNS
            .iter()
            .map(|(name, width)| format!("{:<width$}", truncate(row.display(name), *width), width = *width))
            .collect();
        println!("{}", line.join(" "));
    }

    if let Some(limit) = limit.filter(|limit| *limit < rows.len()) {
        println!("… {} more", rows.len() - limit);
    }
}

fn print_record(record: &NormalizedRecord) {
    println!("{} ({})", record.display("Name"), record.id);
    for (field, value) in &record.display_fields {
        if field != "Name" {
            println!("  {:<24} {}", field, value);
        }
    }

    let rounds = funding_rounds(record);
    if !rounds.is_empty() {
        println!("\nFunding rounds:");
        for round in rounds {
            println!("  {:<16} {:<12} {}", round.round, round.date, round.formatted_amount);
        }
    }
}

fn print_counts(title: &str, counts: &[CategoryCount]) {
    println!("\n{}:", title);
    for entry in counts {
        println!("  {:<28} {}", entry.value, entry.count);
    }
}

fn print_dashboard(dashboard: &Dashboard, rows: &[NormalizedRecord]) {
    let summary = &dashboard.summary;
    println!("Total companies:        {}", summary.total_companies);
    println!("Total funding:          {}", currency_or_na(summary.total_funding));
    println!("Average company age:    {}", decimal_or_na(summary.average_company_age, 1));
    println!("Average funding rounds: {}", decimal_or_na(summary.average_funding_rounds, 1));
    println!("Unicorns:               {}", summary.unicorn_count);

    print_counts("Prop types", &dashboard.prop_types);
    print_counts("Locations", &dashboard.locations);
    print_counts("Funding stages", &dashboard.funding_stages);
    print_counts("Founded", &dashboard.founded_years);

    println!("\nTop funded:");
    for ranked in &dashboard.top_funded {
        let name = rows
            .iter()
            .find(|r| r.id == ranked.id)
            .map(|r| r.display("Name"))
            .unwrap_or(ranked.id.as_str());
        println!("  {:<28} {}", name, format_currency(ranked.value));
    }

    if !dashboard.funding_by_year.is_empty() {
        println!("\nFunding by year:");
        for (year, amount) in &dashboard.funding_by_year {
            println!("  {:<28} {}", year, format_currency(*amount));
        }
    }
}
