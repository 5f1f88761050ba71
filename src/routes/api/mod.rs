mod sales;
mod uploads;
