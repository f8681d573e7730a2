// 该文件是 Kanjian （看见） 项目的一部分。
// src/bin/chem_quiz.rs - 分子目录浏览与问答
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;

use kanjian::chem::{ANSWERS, CATALOG, Carousel, MODEL_SCALE_TO_UNITS, QUESTION, Quiz};

/// 浏览分子目录并回答用途问题
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 列出全部分子
  #[arg(long)]
  pub list: bool,
  /// 以 JSON 输出
  #[arg(long)]
  pub json: bool,
  /// 起始分子名称，默认目录第一个
  #[arg(long, value_name = "NAME")]
  pub molecule: Option<String>,
  /// 在目录上左右移动的步数，可为负
  #[arg(long, default_value_t = 0, allow_negative_numbers = true, value_name = "OFFSET")]
  pub step: isize,
  /// 作答，答案文本或 0 起的选项编号
  #[arg(long, value_name = "ANSWER")]
  pub answer: Option<String>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  if args.list {
    if args.json {
      println!("{}", serde_json::to_string_pretty(&CATALOG)?);
    } else {
      for (index, molecule) in CATALOG.iter().enumerate() {
        println!(
          "{}. {} ({}) {} g/mol, {}",
          index, molecule.name, molecule.formula, molecule.molecular_weight, molecule.kind
        );
      }
    }
    return Ok(());
  }

  let mut carousel = match &args.molecule {
    Some(name) => Carousel::find(name).ok_or_else(|| anyhow!("目录中没有分子: {}", name))?,
    None => Carousel::default(),
  };
  let molecule = carousel.step(args.step);
  info!(
    "当前分子: {}，模型 {}，缩放到 {} 单位",
    molecule.name,
    molecule.asset_path().display(),
    MODEL_SCALE_TO_UNITS
  );

  if args.json {
    println!("{}", serde_json::to_string_pretty(molecule)?);
  } else {
    println!("{} - {}", molecule.name, molecule.formula);
    println!("Molecular weight: {} g/mol", molecule.molecular_weight);
    println!("Type: {}", molecule.kind);
    println!("Uses: {}", molecule.uses.join(", "));
  }

  let Some(answer) = &args.answer else {
    println!();
    println!("{}", QUESTION);
    for (index, answer) in ANSWERS.iter().enumerate() {
      println!("  {}. {}", index, answer);
    }
    return Ok(());
  };

  let mut quiz = Quiz::default();
  match answer.parse::<usize>() {
    Ok(index) => quiz.select(index),
    Err(_) => quiz.select_answer(answer),
  };
  match quiz.submit(molecule) {
    Some(true) => println!("Correct!"),
    Some(false) => println!("Incorrect!"),
    None => println!("Please select an answer."),
  }

  Ok(())
}
