use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use kontera_core::{Account, AccountType, Company, CompanyId, FiscalYear, FiscalYearId, VerificationLine};
use kontera_ledger::PostingEngine;
use kontera_storage::DbPool;

use crate::cli::{CompanyCommands, LineArg, ReportCommands, RuleCommands, SieCommands, VerificationCommands};

pub async fn company(pool: &DbPool, cmd: CompanyCommands) -> Result<()> {
    match cmd {
        CompanyCommands::Create { name, org_number } => {
            let id = kontera_storage::insert_company(pool, &Company::new(&name, &org_number)).await?;
            println!("company {} created", id.0);
        }
        CompanyCommands::AddAccount { company, number, name, account_type } => {
            let account_type = AccountType::from_swedish(&account_type)
                .with_context(|| format!("unknown account type `{account_type}` (expected Tillgång/Skuld/Eget kapital/Intäkt/Kostnad)"))?;
            let id = kontera_storage::insert_account(
                pool,
                &Account::new(CompanyId(company), &number, &name, account_type),
            )
            .await?;
            println!("account {} created", id.0);
        }
        CompanyCommands::SeedAccounts { company, file } => {
            let content = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let seed = kontera_storage::parse_chart_of_accounts_seed(&content)
                .with_context(|| "parsing chart-of-accounts seed")?;
            let created = kontera_storage::seed_chart_of_accounts(pool, CompanyId(company), &seed).await?;
            println!("{created} accounts created");
        }
        CompanyCommands::AddFiscalYear { company, start, end } => {
            let fy = FiscalYear::new(CompanyId(company), start, end);
            let id = kontera_storage::insert_fiscal_year(pool, &fy).await?;
            println!("fiscal year {} created", id.0);
        }
    }
    Ok(())
}

pub async fn verification(pool: &DbPool, engine: &PostingEngine, cmd: VerificationCommands) -> Result<()> {
    match cmd {
        VerificationCommands::Post { company, fiscal_year, date, description, lines } => {
            let mut resolved = Vec::with_capacity(lines.len());
            for line in &lines {
                let account = kontera_storage::get_account_by_number(pool, CompanyId(company), &line.account_number)
                    .await?
                    .with_context(|| format!("unknown account {}", line.account_number))?;
                let account_id = account.id.expect("fetched account always has an id");
                resolved.push(if line.debit {
                    VerificationLine::debit(account_id, line.amount)
                } else {
                    VerificationLine::credit(account_id, line.amount)
                });
            }

            let v = engine
                .create_verification(CompanyId(company), FiscalYearId(fiscal_year), date, &description, resolved)
                .await?;
            println!("verification {} posted, total {}", v.number, v.total());
        }
        VerificationCommands::List { company, fiscal_year } => {
            let verifications =
                kontera_storage::list_verifications(pool, CompanyId(company), FiscalYearId(fiscal_year)).await?;
            for v in verifications {
                println!("{}\t{}\t{}\t{}", v.number, v.transaction_date, v.total(), v.description);
            }
        }
        VerificationCommands::TrialBalance { company, as_of } => {
            let rows = kontera_ledger::trial_balance(pool, CompanyId(company), as_of).await?;
            for row in rows {
                println!("{}\t{}\t{}\t{}", row.number, row.name, row.debit_col, row.credit_col);
            }
        }
    }
    Ok(())
}

pub async fn sie(pool: &DbPool, engine: &PostingEngine, cmd: SieCommands) -> Result<()> {
    match cmd {
        SieCommands::Import { file, company } => {
            let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let data = kontera_sie::parse_bytes(&bytes)?;
            let stats = kontera_sie::import(pool, engine, &data, company.map(CompanyId)).await?;
            println!(
                "imported: company_created={} accounts={} verifications={} skipped={}",
                stats.company_created, stats.accounts_imported, stats.verifications_imported, stats.verifications_skipped
            );
        }
        SieCommands::Export { company, fiscal_year, out } => {
            let company_record = kontera_storage::get_company(pool, CompanyId(company))
                .await?
                .with_context(|| format!("company {company} not found"))?;
            let fy = kontera_storage::get_fiscal_year(pool, FiscalYearId(fiscal_year))
                .await?
                .with_context(|| format!("fiscal year {fiscal_year} not found"))?;
            let accounts = kontera_storage::list_accounts(pool, CompanyId(company)).await?;
            let verifications =
                kontera_storage::list_verifications(pool, CompanyId(company), FiscalYearId(fiscal_year)).await?;

            let text = kontera_sie::emit(&company_record, &fy, &accounts, &verifications);
            std::fs::write(&out, text).with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {}", out.display());
        }
    }
    Ok(())
}

pub async fn close(pool: &DbPool, engine: &PostingEngine, company: i64, fiscal_year: i64, date: Option<NaiveDate>) -> Result<()> {
    let fy = kontera_storage::get_fiscal_year(pool, FiscalYearId(fiscal_year))
        .await?
        .with_context(|| format!("fiscal year {fiscal_year} not found"))?;
    let date = date.unwrap_or_else(|| fy.end_date());

    kontera_ledger::close_fiscal_year(engine, CompanyId(company), FiscalYearId(fiscal_year), date).await?;
    println!("fiscal year {fiscal_year} closed as of {date}");
    Ok(())
}

pub async fn rules(pool: &DbPool, engine: &PostingEngine, cmd: RuleCommands) -> Result<()> {
    match cmd {
        RuleCommands::DepreciationRun { company, fiscal_year, period } => {
            let stats = kontera_rules::run_period_depreciation(
                pool,
                engine,
                CompanyId(company),
                FiscalYearId(fiscal_year),
                period,
            )
            .await?;
            println!("depreciation: posted={} skipped={}", stats.posted, stats.skipped);
        }
        RuleCommands::AccrualRun { company, fiscal_year, as_of } => {
            let stats = kontera_rules::run_auto_accruals(
                pool,
                engine,
                CompanyId(company),
                FiscalYearId(fiscal_year),
                as_of,
            )
            .await?;
            println!("accruals: posted={}", stats.posted);
        }
        RuleCommands::TemplateSeed { company } => {
            let stats = kontera_rules::initialize_standard_templates(pool, CompanyId(company)).await?;
            println!("templates: created={} already_existed={}", stats.created, stats.skipped_existing);
        }
        RuleCommands::TemplateApply { company, fiscal_year, template, amount, date, description } => {
            let template_record = kontera_storage::get_template(pool, kontera_storage::TemplateId(template))
                .await?
                .with_context(|| format!("template {template} not found"))?;
            if template_record.company_id != CompanyId(company) {
                bail!("template {template} does not belong to company {company}");
            }
            let lines = kontera_rules::apply_template(&template_record, amount)?;
            let v = engine
                .create_verification(CompanyId(company), FiscalYearId(fiscal_year), date, &description, lines)
                .await?;
            println!("verification {} posted from template `{}`", v.number, template_record.name);
        }
    }
    Ok(())
}

pub async fn report(pool: &DbPool, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Vat { company, start, end } => {
            let r = kontera_reports::vat::generate(pool, CompanyId(company), start, end).await?;
            println!("box 05 (sales ex VAT):  {}", r.sales_excl_vat);
            println!("box 10 (output 25%):    {}", r.output_vat_25);
            println!("box 11 (output 12%):    {}", r.output_vat_12);
            println!("box 12 (output 6%):     {}", r.output_vat_6);
            println!("box 48 (input VAT):     {}", r.input_vat);
            println!("box 49 (to pay/refund): {}", r.vat_to_pay);
        }
        ReportCommands::Employer { company, start, end } => {
            let r = kontera_reports::employer::generate(pool, CompanyId(company), start, end).await?;
            println!("gross salary:           {}", r.gross_salary);
            println!("calculated contrib ({}%): {}", r.contribution_rate, r.calculated_contributions);
            println!("withholding tax:        {}", r.withholding_tax);
            println!("employer contributions: {}", r.employer_contributions);
            println!("total to pay:           {}", r.total_to_pay);
        }
        ReportCommands::Ink2 { company, start, end } => {
            let r = kontera_reports::ink2::generate(pool, CompanyId(company), start, end).await?;
            for group in &r.groups {
                println!("{:<20}{}", group.group.name(), group.net);
            }
            println!("taxable income:         {}", r.taxable_income);
            println!("tax ({}%):              {}", r.tax_rate, r.tax);
        }
    }
    Ok(())
}
